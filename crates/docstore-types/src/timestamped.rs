use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::object_type::ObjectType;

/// A record the storage layer can persist.
///
/// The storage layer owns two fields on every record: `last_modified` is
/// stamped from blob metadata whenever a record is read, and
/// `last_modified_by` is stamped from the caller's identity whenever a record
/// is written. All other fields are opaque to it.
pub trait Timestamped: Serialize + DeserializeOwned {
    /// Epoch milliseconds of the blob this record was read from.
    fn last_modified(&self) -> Option<i64>;

    fn set_last_modified(&mut self, millis: i64);

    /// Principal that last wrote this record.
    fn last_modified_by(&self) -> Option<&str>;

    fn set_last_modified_by(&mut self, principal: String);
}

/// A [`Timestamped`] record bound to exactly one [`ObjectType`].
pub trait Document: Timestamped {
    const OBJECT_TYPE: ObjectType;
}

/// Implements [`Timestamped`] for a struct with `last_modified: Option<i64>`
/// and `last_modified_by: Option<String>` fields.
#[macro_export]
macro_rules! impl_timestamped {
    ($ty:ty) => {
        impl $crate::Timestamped for $ty {
            fn last_modified(&self) -> Option<i64> {
                self.last_modified
            }

            fn set_last_modified(&mut self, millis: i64) {
                self.last_modified = Some(millis);
            }

            fn last_modified_by(&self) -> Option<&str> {
                self.last_modified_by.as_deref()
            }

            fn set_last_modified_by(&mut self, principal: String) {
                self.last_modified_by = Some(principal);
            }
        }
    };
}
