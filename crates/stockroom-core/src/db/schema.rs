//! SQLite schema definition.

/// Complete database schema for the stockroom.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Products (on-hand inventory)
-- ============================================================================

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,                          -- display name, first casing wins
    name_key TEXT NOT NULL UNIQUE,               -- trimmed lowercase name
    quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Sold history (append-only, one row per sale)
-- ============================================================================

CREATE TABLE IF NOT EXISTS p_sold (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    p_id INTEGER NOT NULL REFERENCES products(id),
    quantity INTEGER NOT NULL CHECK (quantity >= 1),
    sold_at TEXT NOT NULL                        -- UTC+1 wall clock
);

CREATE INDEX IF NOT EXISTS idx_sold_product ON p_sold(p_id);
CREATE INDEX IF NOT EXISTS idx_sold_time ON p_sold(sold_at);

-- ============================================================================
-- Clinic history (append-only, one row per unit)
-- ============================================================================

CREATE TABLE IF NOT EXISTS p_clinic (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    p_id INTEGER NOT NULL REFERENCES products(id),
    sent_at TEXT NOT NULL                        -- UTC+1 wall clock
);

CREATE INDEX IF NOT EXISTS idx_clinic_product ON p_clinic(p_id);
CREATE INDEX IF NOT EXISTS idx_clinic_time ON p_clinic(sent_at);
"#;
