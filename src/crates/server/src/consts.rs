pub const URL_PATH_API: &str = "/api";
