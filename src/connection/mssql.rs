use crate::configuration::settings::Settings;
use crate::connection::{Execute, ExecutionError};
use derivative::*;
use thiserror::Error;
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

const SESSION_INIT_SQL: &str = "SET NOCOUNT ON;";
const RUN_TEST_SQL: &str = "EXEC tSQLt.Run @P1";

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("cannot reach server {server}: {source}")]
    Io {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Database(#[from] tiberius::error::Error),
    #[error("timed out connecting to server {0}")]
    Timeout(String),
}

/// tSQLt session over a single SQL Server connection.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Session {
    server: String,
    #[derivative(Debug = "ignore")]
    client: Client<Compat<TcpStream>>,
}

impl Session {
    pub async fn connect(settings: &Settings) -> Result<Self, ConnectError> {
        let server = settings.server.clone();
        let limit = settings.connect_timeout;
        match timeout(limit, Self::open(settings)).await {
            Ok(session) => session,
            Err(_) => Err(ConnectError::Timeout(server)),
        }
    }

    async fn open(settings: &Settings) -> Result<Self, ConnectError> {
        let (host, port) = settings.address();
        let mut config = Config::new();
        config.host(&host);
        config.port(port);
        config.database(&settings.database);
        config.authentication(AuthMethod::sql_server(&settings.user, &settings.password));
        if settings.trust_cert {
            config.trust_cert();
        }

        debug!("Connecting to {}:{} database {}", host, port, settings.database);
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|source| ConnectError::Io {
                server: settings.server.clone(),
                source,
            })?;
        tcp.set_nodelay(true).map_err(|source| ConnectError::Io {
            server: settings.server.clone(),
            source,
        })?;
        let mut client = Client::connect(config, tcp.compat_write()).await?;
        client.simple_query(SESSION_INIT_SQL).await?.into_results().await?;
        info!("Connected to server {}", settings.server);

        Ok(Self {
            server: settings.server.clone(),
            client,
        })
    }
}

impl Execute for Session {
    async fn execute(&mut self, identity: &str) -> Result<(), ExecutionError> {
        let name = identity.to_owned();
        trace!("{} <- {} @P1 = {}", self.server, RUN_TEST_SQL, name);
        match self.client.execute(RUN_TEST_SQL, &[&name]).await {
            Ok(result) => {
                trace!("{} finished, rows affected {:?}", name, result.rows_affected());
                Ok(())
            }
            Err(tiberius::error::Error::Server(token)) => {
                Err(ExecutionError::Server(token.message().to_owned()))
            }
            Err(e) => Err(ExecutionError::Transport(e.to_string())),
        }
    }
}
