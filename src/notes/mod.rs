//! Free-form notes: CRUD over the `notes` table.

pub mod routes;
