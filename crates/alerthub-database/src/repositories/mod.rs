//! PostgreSQL implementations of the store traits.

pub mod alert;
pub mod delivery;
pub mod directory;
pub mod preference;

use std::sync::Arc;

use sqlx::PgPool;

use alerthub_core::error::{AppError, ErrorKind};

use crate::store::Stores;

pub use alert::AlertRepository;
pub use delivery::DeliveryRepository;
pub use directory::DirectoryRepository;
pub use preference::PreferenceRepository;

/// Wire every store to PostgreSQL repositories sharing one pool.
pub fn postgres_stores(pool: &PgPool) -> Stores {
    Stores {
        alerts: Arc::new(AlertRepository::new(pool.clone())),
        directory: Arc::new(DirectoryRepository::new(pool.clone())),
        preferences: Arc::new(PreferenceRepository::new(pool.clone())),
        deliveries: Arc::new(DeliveryRepository::new(pool.clone())),
    }
}

/// Map a sqlx error, treating undecodable stored values as misconfiguration.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        let kind = if matches!(e, sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) {
            ErrorKind::Configuration
        } else {
            ErrorKind::Database
        };
        AppError::with_source(kind, context, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_failures_map_to_configuration() {
        let err = db_error("Failed to find alert")(sqlx::Error::ColumnDecode {
            index: "visibility".to_string(),
            source: "unknown variant Region".into(),
        });
        assert_eq!(err.kind, ErrorKind::Configuration);

        let err = db_error("Failed to find alert")(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.is_store_failure());
    }
}
