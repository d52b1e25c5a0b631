//!  Storage is organized through [record_storage::RecordStorageImpl].
//!  The basic idea is:
//!   - There is a directory with all the records.
//!   - Finished records, running records and categories each live in their own json lines file.
//!   - The engine never touches storage, the [crate::report] layer fetches and hands records over.

pub mod record_storage;
