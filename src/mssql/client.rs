use tiberius::{Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use crate::error::SqlHelperError;

/// Type alias for a SQL Server client over a tokio TCP stream
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Open a TCP connection to the configured server and log in.
///
/// A routing response (Azure SQL gateway) is followed once.
///
/// # Errors
/// Returns `SqlHelperError::ConnectionError` if the TCP connection fails, or the
/// tiberius error if the TDS login fails.
pub async fn create_mssql_client(config: Config) -> Result<MssqlClient, SqlHelperError> {
    let tcp = connect_tcp(&config.get_addr()).await?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(tiberius::error::Error::Routing { host, port }) => {
            debug!(%host, port, "SQL Server redirected the login");
            let mut config = config;
            config.host(&host);
            config.port(port);
            let tcp = connect_tcp(&config.get_addr()).await?;
            Ok(Client::connect(config, tcp.compat_write()).await?)
        }
        Err(e) => Err(e.into()),
    }
}

async fn connect_tcp(addr: &str) -> Result<TcpStream, SqlHelperError> {
    let tcp = TcpStream::connect(addr)
        .await
        .map_err(|e| SqlHelperError::ConnectionError(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| SqlHelperError::ConnectionError(format!("TCP connection error: {e}")))?;
    Ok(tcp)
}
