use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

// Helper macro to define aggregate ID newtypes and common trait impls
macro_rules! define_id {
    ($name:ident $(, $extra:ident)*) => {
        #[derive(Debug, Clone, PartialEq $(, $extra)*)]
        pub struct $name(i64);

        impl $name {
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(UserId, Eq, Hash, PartialOrd, Ord);
define_id!(SongId, Eq, Hash, PartialOrd, Ord);
define_id!(ArtistId, Eq, Hash, PartialOrd, Ord);
define_id!(AlbumId, Eq, Hash, PartialOrd, Ord);

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown subject kind: {0}")]
pub struct UnknownSubjectKind(pub String);

/// The kinds of things listening statistics can be computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectKind {
    Song,
    Artist,
    Album,
    Genre,
}

impl SubjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            SubjectKind::Song => "song",
            SubjectKind::Artist => "artist",
            SubjectKind::Album => "album",
            SubjectKind::Genre => "genre",
        }
    }
}

impl FromStr for SubjectKind {
    type Err = UnknownSubjectKind;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "song" | "songs" => Ok(SubjectKind::Song),
            "artist" | "artists" => Ok(SubjectKind::Artist),
            "album" | "albums" => Ok(SubjectKind::Album),
            "genre" | "genres" => Ok(SubjectKind::Genre),
            _ => Err(UnknownSubjectKind(s.to_string())),
        }
    }
}

impl Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A concrete subject: one song, artist, album or genre.
///
/// The derived ordering sorts by kind first and then by identifier, which is
/// the tie-break order used by popularity rankings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    Song(SongId),
    Artist(ArtistId),
    Album(AlbumId),
    Genre(String),
}

impl Subject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Song(_) => SubjectKind::Song,
            Subject::Artist(_) => SubjectKind::Artist,
            Subject::Album(_) => SubjectKind::Album,
            Subject::Genre(_) => SubjectKind::Genre,
        }
    }

    /// Build a subject from its kind and the raw identifier used on the wire.
    pub fn parse(kind: SubjectKind, raw_id: &str) -> Option<Subject> {
        match kind {
            SubjectKind::Genre => {
                let genre = raw_id.trim();
                (!genre.is_empty()).then(|| Subject::Genre(genre.to_string()))
            }
            SubjectKind::Song => raw_id.parse::<i64>().ok().map(|id| Subject::Song(id.into())),
            SubjectKind::Artist => raw_id
                .parse::<i64>()
                .ok()
                .map(|id| Subject::Artist(id.into())),
            SubjectKind::Album => raw_id
                .parse::<i64>()
                .ok()
                .map(|id| Subject::Album(id.into())),
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Song(id) => write!(f, "song:{}", id),
            Subject::Artist(id) => write!(f, "artist:{}", id),
            Subject::Album(id) => write!(f, "album:{}", id),
            Subject::Genre(name) => write!(f, "genre:{}", name),
        }
    }
}
