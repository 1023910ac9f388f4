use aws_sdk_dynamodb::{Client, error, operation};

/// Scan operation.
///
/// Sends a single `Scan` request: only the first page of results is returned.
/// When the table holds more than one page, the output carries a
/// `last_evaluated_key` that is not followed.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use ddbcli::read;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let scan = read::scan::Scan {
///     table_name: "users".to_string(),
///     ..Default::default()
/// };
/// scan.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Scan {
    /// Whether to use a strongly consistent read.
    pub consistent_read: Option<bool>,
    /// The name of the table to scan.
    pub table_name: String,
}

impl Scan {
    /// Execute the scan operation.
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<operation::scan::ScanOutput, error::SdkError<operation::scan::ScanError>> {
        client
            .scan()
            .set_consistent_read(self.consistent_read)
            .table_name(self.table_name)
            .send()
            .await
    }
}
