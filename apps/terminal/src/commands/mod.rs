//! # Commands Module
//!
//! Everything a front end can ask the terminal to do.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── session.rs    ◄─── Login, restore, logout
//! ├── draft.rs      ◄─── Order draft manipulation
//! ├── order.rs      ◄─── Send to kitchen, append, reprint, close
//! ├── printer.rs    ◄─── Scan, select, status
//! ├── catalog.rs    ◄─── Categories, products, tables
//! ├── members.rs    ◄─── Store staff
//! └── dashboard.rs  ◄─── Sales summary
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs the draft
//! fn increment(draft: &DraftState, uid: &str)
//!
//! // Needs the backend
//! async fn list_tables(session: &SessionState, show_all: bool)
//!
//! // Needs everything
//! async fn send_to_kitchen(draft: &DraftState, session: &SessionState,
//!                          printer: &PrinterState, config: &ConfigState)
//! ```

pub mod catalog;
pub mod dashboard;
pub mod draft;
pub mod members;
pub mod order;
pub mod printer;
pub mod session;
