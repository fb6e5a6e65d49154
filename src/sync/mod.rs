/// Photo synchronization module
///
/// - Folder and file scanning with the catalog ordering (scan.rs)
/// - The filesystem → catalog reconciler (reconcile.rs)
/// - Demo seed data and reset (seed.rs)
pub mod reconcile;
pub mod scan;
pub mod seed;
