//! ScyllaDB schema creation

use scylla::Session;

use crate::error::StoreError;

/// Create the keyspace if it doesn't exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), StoreError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| StoreError::Schema(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

/// Create all required tables
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), StoreError> {
    let listings_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.listings (
            id UUID,
            title TEXT,
            description TEXT,
            price DOUBLE,
            location TEXT,
            address TEXT,
            city TEXT,
            kind TEXT,
            amenities LIST<TEXT>,
            images LIST<TEXT>,
            contact_name TEXT,
            contact_phone TEXT,
            nearby_locations LIST<TEXT>,
            metadata_json TEXT,
            created_at TIMESTAMP,
            PRIMARY KEY (id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(listings_table, &[])
        .await
        .map_err(|e| StoreError::Schema(format!("Failed to create listings table: {}", e)))?;

    tracing::info!("All tables created successfully");
    Ok(())
}
