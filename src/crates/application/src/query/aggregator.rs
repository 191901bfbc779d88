//! 基于播放历史的时间窗口统计。
//!
//! 这里全部是纯函数：输入记录集合、歌曲索引和时间窗口，输出确定的结果。

use chrono::{DateTime, Utc};
use domain::song::Song;
use domain::value::{SongId, Subject, UserId};
use model::analytics::{GenreTopSongs, TopSong};
use model::playback_history::{HistoryRecord, TimeWindow};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub type SongIndex = HashMap<SongId, Song>;

pub fn index_songs(songs: Vec<Song>) -> SongIndex {
    songs.into_iter().map(|song| (song.id.clone(), song)).collect()
}

/// 目录中是否存在属于该主体的歌曲
pub fn is_known(songs: &SongIndex, subject: &Subject) -> bool {
    songs.values().any(|song| song.belongs_to(subject))
}

fn record_belongs(record: &HistoryRecord, songs: &SongIndex, subject: &Subject) -> bool {
    match subject {
        Subject::Song(id) => &record.song_id == id,
        _ => songs
            .get(&record.song_id)
            .is_some_and(|song| song.belongs_to(subject)),
    }
}

fn in_window<'a>(
    records: &'a [HistoryRecord],
    window: &'a TimeWindow,
) -> impl Iterator<Item = &'a HistoryRecord> + 'a {
    records.iter().filter(move |r| window.contains(r.played_at))
}

/// 窗口内收听过该主体的不同用户数
pub fn listener_count(
    records: &[HistoryRecord],
    songs: &SongIndex,
    subject: &Subject,
    window: &TimeWindow,
) -> i64 {
    in_window(records, window)
        .filter(|r| record_belongs(r, songs, subject))
        .map(|r| &r.user_id)
        .collect::<HashSet<&UserId>>()
        .len() as i64
}

/// 窗口内该主体的播放次数
pub fn play_count(
    records: &[HistoryRecord],
    songs: &SongIndex,
    subject: &Subject,
    window: &TimeWindow,
) -> i64 {
    in_window(records, window)
        .filter(|r| record_belongs(r, songs, subject))
        .count() as i64
}

/// 按播放次数排序。
///
/// 次数相同时，最近一次播放更早的在前；再相同按歌曲 id 升序。
pub fn rank_songs<'a>(
    records: impl IntoIterator<Item = &'a HistoryRecord>,
    limit: usize,
) -> Vec<TopSong> {
    let mut tally: HashMap<&SongId, (i64, DateTime<Utc>)> = HashMap::new();
    for record in records {
        let entry = tally
            .entry(&record.song_id)
            .or_insert((0, record.played_at));
        entry.0 += 1;
        if record.played_at > entry.1 {
            entry.1 = record.played_at;
        }
    }

    let mut ranked: Vec<TopSong> = tally
        .into_iter()
        .map(|(song_id, (play_count, last_played_at))| TopSong {
            song_id: song_id.clone(),
            play_count,
            last_played_at,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.play_count
            .cmp(&a.play_count)
            .then(a.last_played_at.cmp(&b.last_played_at))
            .then(a.song_id.cmp(&b.song_id))
    });
    ranked.truncate(limit);
    ranked
}

/// 所有歌曲的排行，不分流派
pub fn top_songs_overall(
    records: &[HistoryRecord],
    window: &TimeWindow,
    limit: usize,
) -> Vec<TopSong> {
    rank_songs(in_window(records, window), limit)
}

/// 每个流派各自的排行，流派按名称排序。目录中找不到的歌曲不参与分组。
pub fn top_songs(
    records: &[HistoryRecord],
    songs: &SongIndex,
    window: &TimeWindow,
    limit: usize,
) -> Vec<GenreTopSongs> {
    let mut by_genre: BTreeMap<&str, Vec<&HistoryRecord>> = BTreeMap::new();
    for record in in_window(records, window) {
        if let Some(song) = songs.get(&record.song_id) {
            by_genre.entry(song.genre.as_str()).or_default().push(record);
        }
    }
    by_genre
        .into_iter()
        .map(|(genre, records)| GenreTopSongs {
            genre: genre.to_string(),
            songs: rank_songs(records, limit),
        })
        .collect()
}

/// 属于某个主体（艺术家、专辑、流派）的歌曲排行
pub fn subject_top_songs(
    records: &[HistoryRecord],
    songs: &SongIndex,
    subject: &Subject,
    window: &TimeWindow,
    limit: usize,
) -> Vec<TopSong> {
    rank_songs(
        in_window(records, window).filter(|r| record_belongs(r, songs, subject)),
        limit,
    )
}

/// 主体在同类主体中按听众数的排名（从 1 开始）。
///
/// 同类主体的全集来自歌曲目录；听众数相同时按主体标识升序。
/// 主体不在目录中时返回 `None`。
pub fn popularity_rank(
    records: &[HistoryRecord],
    songs: &SongIndex,
    subject: &Subject,
    window: &TimeWindow,
) -> Option<usize> {
    let kind = subject.kind();
    let universe: BTreeSet<Subject> = songs
        .values()
        .flat_map(|song| song.subjects())
        .filter(|s| s.kind() == kind)
        .collect();
    if !universe.contains(subject) {
        return None;
    }

    let mut listeners: HashMap<Subject, HashSet<&UserId>> = HashMap::new();
    for record in in_window(records, window) {
        if let Some(song) = songs.get(&record.song_id) {
            for s in song.subjects().into_iter().filter(|s| s.kind() == kind) {
                listeners.entry(s).or_default().insert(&record.user_id);
            }
        }
    }

    let mut ranked: Vec<(usize, Subject)> = universe
        .into_iter()
        .map(|s| (listeners.get(&s).map_or(0, |users| users.len()), s))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    ranked
        .iter()
        .position(|(_, s)| s == subject)
        .map(|index| index + 1)
}
