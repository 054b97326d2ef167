pub const PRAGMAS: &str = "
    PRAGMA foreign_keys = ON;
";

pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS wallpapers (
        id INTEGER PRIMARY KEY,
        path TEXT NOT NULL,
        hash TEXT UNIQUE NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_wallpapers_path ON wallpapers (path);

    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS wallpaper_tags (
        wallpaper_id INTEGER NOT NULL,
        tag_id INTEGER NOT NULL,
        FOREIGN KEY(wallpaper_id) REFERENCES wallpapers(id) ON DELETE CASCADE,
        FOREIGN KEY(tag_id) REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY(wallpaper_id, tag_id)
    );

    CREATE INDEX IF NOT EXISTS idx_wallpaper_tags_tag ON wallpaper_tags (tag_id);
";
