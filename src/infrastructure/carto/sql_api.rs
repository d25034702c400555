use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};
use crate::domain::{error::TransferError, ports::DatasetSource};

/// Client for the CARTO SQL API `copyto` endpoint, which streams the result
/// of a PostgreSQL `COPY TO` statement over HTTPS.
pub struct CartoSqlClient {
    client: Client,
    copyto_url: String,
    api_key: String,
}

impl CartoSqlClient {
    pub fn new(username: &str, api_key: String) -> Self {
        let copyto_url = copyto_url(username);
        debug!("Initializing CARTO SQL API client for endpoint {}", copyto_url);
        Self {
            client: Client::new(),
            copyto_url,
            api_key,
        }
    }
}

pub(crate) fn copyto_url(username: &str) -> String {
    format!("https://{}.carto.com/api/v2/sql/copyto", username)
}

pub(crate) fn copyto_query(table: &str) -> String {
    format!("COPY {} TO stdout WITH (FORMAT csv, HEADER true)", table)
}

#[async_trait]
impl DatasetSource for CartoSqlClient {
    async fn fetch_table(&self, table: &str) -> Result<Vec<u8>, TransferError> {
        info!("Downloading dataset {}", table);
        let query = copyto_query(table);
        debug!("CARTO copy query: {}", query);

        let response = self.client
            .get(&self.copyto_url)
            .query(&[("q", query.as_str()), ("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach CARTO SQL API for {}: {}", table, e);
                TransferError::Source(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("CARTO SQL API returned {} for {}: {}", status, table, body);
            return Err(TransferError::Source(format!(
                "CARTO SQL API returned {} for table {}: {}",
                status, table, body
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            error!("Failed to read CARTO response body for {}: {}", table, e);
            TransferError::Source(e.to_string())
        })?;

        info!("Dataset {} downloaded, {} bytes", table, bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copyto_url_targets_the_account_subdomain() {
        assert_eq!(
            copyto_url("acme"),
            "https://acme.carto.com/api/v2/sql/copyto"
        );
    }

    #[test]
    fn copyto_query_requests_csv_with_header() {
        assert_eq!(
            copyto_query("roads"),
            "COPY roads TO stdout WITH (FORMAT csv, HEADER true)"
        );
    }
}
