//! # Repository Module
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Use case                                                               │
//! │       │                                                                 │
//! │       │  db.items().insert_many(&items)                                │
//! │       ▼                                                                 │
//! │  ItemRepository                     SettingsRepository                  │
//! │  ├── select_all / watch_all         ├── get_long(key, default)         │
//! │  ├── select_by_id / watch_by_id     └── put_long(key, value)           │
//! │  ├── insert_many                                                        │
//! │  ├── update_favorite                                                    │
//! │  └── delete_all                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Cached items and observable selects
//! - [`SettingsRepository`](settings::SettingsRepository) - Key/value longs

pub mod item;
pub mod settings;
