use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::domain::{
    error::TransferError,
    models::{CollisionStrategy, Column, ColumnKind, Dataset},
    ports::DatasetSink,
};

/// PostgreSQL truncates identifiers at NAMEDATALEN - 1 bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

/// PostgreSQL caps bind parameters per statement at u16::MAX.
const PG_BIND_LIMIT: usize = 65_535;

const INSERT_CHUNK_ROWS: usize = 500;

pub struct PostgresDataRepository {
    pool: PgPool,
}

impl PostgresDataRepository {
    pub async fn connect(config: &Config) -> Result<Self, TransferError> {
        debug!(
            "Connecting to PostgreSQL at {}:{}/{}",
            config.host, config.port, config.database
        );

        let sslmode = config.sslmode.as_deref().unwrap_or("prefer");
        let sslmode = sslmode.parse::<PgSslMode>().map_err(|e| {
            TransferError::Config(format!("Invalid sslmode '{}': {}", sslmode, e))
        })?;

        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(sslmode);

        if let Some(cert) = &config.sslrootcert {
            options = options.ssl_root_cert(cert);
        }
        if let Some(cert) = &config.sslcert {
            options = options.ssl_client_cert(cert);
        }
        if let Some(key) = &config.sslkey {
            options = options.ssl_client_key(key);
        }

        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                TransferError::Database(e.to_string())
            })?;

        debug!("PostgreSQL connection established");
        Ok(Self { pool })
    }
}

/// Clamps a destination table name below the PostgreSQL identifier limit,
/// as the server would otherwise truncate it silently.
pub(crate) fn clamp_table_name(name: &str) -> String {
    if name.len() >= MAX_IDENTIFIER_LEN {
        let clamped: String = name.chars().take(MAX_IDENTIFIER_LEN - 1).collect();
        warn!("Table name too large, truncating to {}", clamped);
        clamped
    } else {
        name.to_string()
    }
}

/// Validates and double-quotes an identifier before it is interpolated into
/// generated SQL. Names are restricted to letters, digits and underscores.
pub(crate) fn quote_ident(name: &str) -> Result<String, TransferError> {
    let pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
        .map_err(|e| TransferError::Config(e.to_string()))?;
    if !pattern.is_match(name) {
        return Err(TransferError::Config(format!(
            "Invalid SQL identifier: '{}'",
            name
        )));
    }
    Ok(format!("\"{}\"", name))
}

pub(crate) fn build_create_table(
    qualified: &str,
    columns: &[Column],
) -> Result<String, TransferError> {
    let cols = columns
        .iter()
        .map(|c| Ok(format!("{} {}", quote_ident(&c.name)?, c.kind.sql_type())))
        .collect::<Result<Vec<_>, TransferError>>()?;
    Ok(format!("CREATE TABLE {} ({})", qualified, cols.join(", ")))
}

fn cast_suffix(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Integer => "::bigint",
        ColumnKind::Float => "::double precision",
        ColumnKind::Boolean => "::boolean",
        ColumnKind::Text => "",
        // hex EWKB text, parsed by PostGIS geometry input
        ColumnKind::Geometry => "::geometry",
    }
}

/// Builds a multi-row INSERT binding every cell as text and casting it to
/// the column's inferred type.
pub(crate) fn build_insert(
    qualified: &str,
    columns: &[Column],
    row_count: usize,
) -> Result<String, TransferError> {
    let names = columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Result<Vec<_>, TransferError>>()?;

    let mut groups = Vec::with_capacity(row_count);
    for row in 0..row_count {
        let placeholders: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(col, c)| format!("${}{}", row * columns.len() + col + 1, cast_suffix(c.kind)))
            .collect();
        groups.push(format!("({})", placeholders.join(", ")));
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES {}",
        qualified,
        names.join(", "),
        groups.join(", ")
    ))
}

#[async_trait]
impl DatasetSink for PostgresDataRepository {
    async fn write_dataset(
        &self,
        schema: &str,
        dataset: &Dataset,
        if_exists: CollisionStrategy,
    ) -> Result<u64, TransferError> {
        let table = clamp_table_name(&dataset.table);
        let qualified = format!("{}.{}", quote_ident(schema)?, quote_ident(&table)?);
        debug!("Writing {} rows to {}", dataset.rows.len(), qualified);

        match if_exists {
            CollisionStrategy::Replace => {
                debug!("Dropping {} if it exists", qualified);
                sqlx::query(&format!("DROP TABLE IF EXISTS {}", qualified))
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        error!("Failed to drop table {}: {}", qualified, e);
                        TransferError::Database(e.to_string())
                    })?;
            }
            CollisionStrategy::Fail => {
                let existing: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
                    .bind(&qualified)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| {
                        error!("Failed to check for existing table {}: {}", qualified, e);
                        TransferError::Database(e.to_string())
                    })?;
                if existing.is_some() {
                    return Err(TransferError::TableExists(qualified));
                }
            }
        }

        let create = build_create_table(&qualified, &dataset.columns)?;
        debug!("Creating table: {}", create);
        sqlx::query(&create)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to create table {}: {}", qualified, e);
                TransferError::Database(e.to_string())
            })?;

        if dataset.rows.is_empty() {
            info!("No rows to insert into {}", qualified);
            return Ok(0);
        }

        // one statement per chunk, capped by the bind parameter limit
        let chunk_rows = INSERT_CHUNK_ROWS
            .min(PG_BIND_LIMIT / dataset.columns.len().max(1))
            .max(1);

        let mut total = 0u64;
        for chunk in dataset.rows.chunks(chunk_rows) {
            let insert = build_insert(&qualified, &dataset.columns, chunk.len())?;
            let mut query = sqlx::query(&insert);
            for row in chunk {
                for cell in row {
                    query = query.bind(cell.as_deref());
                }
            }
            let result = query.execute(&self.pool).await.map_err(|e| {
                error!("Failed to insert rows into {}: {}", qualified, e);
                TransferError::Database(e.to_string())
            })?;
            total += result.rows_affected();
            debug!("Inserted {} of {} rows into {}", total, dataset.rows.len(), qualified);
        }

        info!("✅ Successfully inserted {} rows into {}", total, qualified);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column { name: "id".to_string(), kind: ColumnKind::Integer },
            Column { name: "name".to_string(), kind: ColumnKind::Text },
            Column { name: "the_geom".to_string(), kind: ColumnKind::Geometry },
        ]
    }

    #[test]
    fn quote_ident_accepts_plain_names() {
        assert_eq!(quote_ident("roads").unwrap(), "\"roads\"");
        assert_eq!(quote_ident("_tmp2").unwrap(), "\"_tmp2\"");
    }

    #[test]
    fn quote_ident_rejects_hostile_names() {
        assert!(quote_ident("bad-name").is_err());
        assert!(quote_ident("1abc").is_err());
        assert!(quote_ident("ro\"gue").is_err());
        assert!(quote_ident("a; DROP TABLE x").is_err());
        assert!(quote_ident("").is_err());
    }

    #[test]
    fn clamp_table_name_leaves_short_names_alone() {
        assert_eq!(clamp_table_name("roads"), "roads");
    }

    #[test]
    fn clamp_table_name_truncates_at_the_identifier_limit() {
        let long = "a".repeat(80);
        let clamped = clamp_table_name(&long);
        assert_eq!(clamped.len(), MAX_IDENTIFIER_LEN - 1);

        let exactly_63 = "b".repeat(63);
        assert_eq!(clamp_table_name(&exactly_63).len(), 62);
    }

    #[test]
    fn create_table_lists_typed_columns() {
        let sql = build_create_table("\"public\".\"roads\"", &columns()).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"public\".\"roads\" (\"id\" bigint, \"name\" text, \
             \"the_geom\" geometry(Geometry, 4326))"
        );
    }

    #[test]
    fn insert_casts_each_placeholder_to_the_column_type() {
        let sql = build_insert("\"public\".\"roads\"", &columns(), 2).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"roads\" (\"id\", \"name\", \"the_geom\") VALUES \
             ($1::bigint, $2, $3::geometry), ($4::bigint, $5, $6::geometry)"
        );
    }

    #[test]
    fn create_table_rejects_hostile_column_names() {
        let cols = vec![Column { name: "x); DROP TABLE y".to_string(), kind: ColumnKind::Text }];
        assert!(build_create_table("\"s\".\"t\"", &cols).is_err());
    }
}
