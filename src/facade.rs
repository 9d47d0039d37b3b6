//! Runs a pipeline on its own task and hands back a single-shot result.
//!
//! The caller builds a [`Status`] and gives it to the task, which owns it
//! until completion. The task publishes the record (if any) on a capacity-1
//! channel and returns the completed `Status` through its `JoinHandle`.
//! Timeouts and hard errors publish nothing; the sender is dropped so the
//! receiver observes a closed channel.

use crate::{
    errors::WhoisError,
    record::{DomainRecord, IpRecord, Outcome},
    whois::WhoisService,
};
use serde::Serialize;
use std::fmt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RespType {
    Found,
    NotFound,
    ParseError,
    Timeout,
    Error,
}

impl RespType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RespType::Found => "found",
            RespType::NotFound => "not_found",
            RespType::ParseError => "parse_error",
            RespType::Timeout => "timeout",
            RespType::Error => "error",
        }
    }

    fn for_error(error: &WhoisError) -> Self {
        match error {
            WhoisError::NotFound => RespType::NotFound,
            WhoisError::ParseError(_) => RespType::ParseError,
            e if e.is_timeout() => RespType::Timeout,
            _ => RespType::Error,
        }
    }
}

impl fmt::Display for RespType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One in-flight query. `resp_type` stays `None` until the terminal event.
#[derive(Debug)]
pub struct Status {
    pub domain_or_ip: String,
    pub public_suffixes: Vec<String>,
    /// Requested server before completion, answering server after a fetch succeeded.
    pub whois_server: Option<String>,
    pub resp_type: Option<RespType>,
    pub error: Option<WhoisError>,
}

impl Status {
    pub fn domain(domain: impl Into<String>, public_suffixes: Vec<String>, whois_server: Option<String>) -> Self {
        Self {
            domain_or_ip: domain.into(),
            public_suffixes,
            whois_server,
            resp_type: None,
            error: None,
        }
    }

    pub fn ip(ip: impl Into<String>, whois_server: Option<String>) -> Self {
        Self::domain(ip, Vec::new(), whois_server)
    }

    /// Final state; `Error` if the task never completed the status.
    pub fn outcome(&self) -> RespType {
        self.resp_type.unwrap_or(RespType::Error)
    }

    /// A fresh, unset status for the same query.
    fn identity(&self) -> Self {
        Self::domain(self.domain_or_ip.clone(), self.public_suffixes.clone(), self.whois_server.clone())
    }

    fn complete(&mut self, error: Option<WhoisError>) {
        debug_assert!(self.resp_type.is_none(), "status completed twice");
        let error = error.map(WhoisError::normalize);
        self.resp_type = Some(error.as_ref().map_or(RespType::Found, RespType::for_error));
        self.error = error;
    }
}

/// Records that know which server produced them.
trait Answered {
    fn answered_by(&self) -> &str;
}

impl Answered for DomainRecord {
    fn answered_by(&self) -> &str {
        &self.whois_server
    }
}

impl Answered for IpRecord {
    fn answered_by(&self) -> &str {
        &self.whois_server
    }
}

pub struct PendingQuery<R> {
    receiver: mpsc::Receiver<R>,
    task: JoinHandle<Status>,
    // Completed instead when the task itself fails.
    fallback: Status,
}

impl<R> PendingQuery<R> {
    /// Waits for the task; the record is `None` when nothing was published.
    pub async fn finish(mut self) -> (Status, Option<R>) {
        let record = self.receiver.recv().await;
        let status = match self.task.await {
            Ok(status) => status,
            Err(e) => {
                error!(query = %self.fallback.domain_or_ip, "Query task failed: {}", e);
                let mut status = self.fallback;
                status.complete(Some(WhoisError::Internal(format!("query task failed: {}", e))));
                status
            }
        };
        (status, record)
    }
}

pub fn spawn_domain_query(service: WhoisService, status: Status) -> PendingQuery<DomainRecord> {
    let (sender, receiver) = mpsc::channel(1);
    let fallback = status.identity();
    let task = tokio::spawn(async move {
        let result = service
            .query_domain(&status.public_suffixes, status.whois_server.as_deref())
            .await;
        publish(status, result, sender).await
    });
    PendingQuery { receiver, task, fallback }
}

pub fn spawn_ip_query(service: WhoisService, status: Status) -> PendingQuery<IpRecord> {
    let (sender, receiver) = mpsc::channel(1);
    let fallback = status.identity();
    let task = tokio::spawn(async move {
        let result = service.query_ip(&status.domain_or_ip, status.whois_server.as_deref()).await;
        publish(status, result, sender).await
    });
    PendingQuery { receiver, task, fallback }
}

async fn publish<R: Answered>(
    mut status: Status,
    result: Result<Outcome<R>, WhoisError>,
    sender: mpsc::Sender<R>,
) -> Status {
    match result {
        Ok(Outcome { record, error }) => {
            status.whois_server = Some(record.answered_by().to_string());
            status.complete(error);
            if sender.send(record).await.is_err() {
                debug!(query = %status.domain_or_ip, "Result receiver dropped before delivery");
            }
        }
        Err(e) => status.complete(Some(e)),
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{Catalog, ServerEntry},
        config::Config,
        transport::Transport,
    };
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Arc};

    struct FixedTransport(Result<&'static str, ()>);

    #[async_trait]
    impl Transport for FixedTransport {
        async fn fetch(&self, _destination: &str, _query: &str) -> Result<String, WhoisError> {
            self.0.map(str::to_string).map_err(|_| WhoisError::Timeout)
        }
    }

    fn service(answer: Result<&'static str, ()>) -> WhoisService {
        let catalog = Catalog::from_map(HashMap::from([("io".to_string(), vec![ServerEntry::new("whois.nic.io")])]));
        WhoisService::new(Arc::new(Config::default()), Arc::new(catalog))
            .with_transport(Arc::new(FixedTransport(answer)))
    }

    fn domain_status(name: &str) -> Status {
        Status::domain(name, vec![name.to_string()], None)
    }

    #[tokio::test]
    async fn test_found_publishes_record() {
        let pending = spawn_domain_query(
            service(Ok("Domain Name: github.io\nRegistrar: GitHub\n")),
            domain_status("github.io"),
        );
        let (status, record) = pending.finish().await;
        assert_eq!(status.resp_type, Some(RespType::Found));
        assert!(status.error.is_none());
        assert_eq!(status.whois_server.as_deref(), Some("whois.nic.io"));
        assert_eq!(record.unwrap().whois_server, "whois.nic.io");
    }

    #[tokio::test]
    async fn test_not_found_still_publishes() {
        let pending = spawn_domain_query(service(Ok("NOT FOUND\n")), domain_status("nothing.io"));
        let (status, record) = pending.finish().await;
        assert_eq!(status.outcome(), RespType::NotFound);
        assert_eq!(status.error.unwrap().to_string(), "domain/ip not found");
        assert_eq!(record.unwrap().raw_text, "NOT FOUND\n");
    }

    #[tokio::test]
    async fn test_timeout_publishes_nothing() {
        let pending = spawn_domain_query(service(Err(())), domain_status("github.io"));
        let (status, record) = pending.finish().await;
        assert_eq!(status.outcome(), RespType::Timeout);
        assert_eq!(status.error.unwrap().to_string(), "timeout");
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_other_error_publishes_nothing() {
        let pending = spawn_domain_query(service(Ok("x")), domain_status("unknown.abcde"));
        let (status, record) = pending.finish().await;
        assert_eq!(status.outcome(), RespType::Error);
        assert!(matches!(status.error, Some(WhoisError::UnknownWhoisServer)));
        assert!(status.whois_server.is_none());
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_ip_query() {
        let pending = spawn_ip_query(
            service(Ok("inetnum: 10.0.0.0 - 10.255.255.255\n")),
            Status::ip("10.1.2.3", Some("whois.example.net".to_string())),
        );
        let (status, record) = pending.finish().await;
        assert_eq!(status.outcome(), RespType::Found);
        assert_eq!(status.domain_or_ip, "10.1.2.3");
        assert_eq!(record.unwrap().parsed.unwrap().networks.len(), 1);
    }

    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn fetch(&self, _destination: &str, _query: &str) -> Result<String, WhoisError> {
            panic!("transport exploded")
        }
    }

    #[tokio::test]
    async fn test_failed_task_keeps_query_identity() {
        let service = service(Ok("unused")).with_transport(Arc::new(PanickingTransport));
        let pending = spawn_domain_query(service, domain_status("github.io"));
        let (status, record) = pending.finish().await;
        assert_eq!(status.outcome(), RespType::Error);
        assert_eq!(status.domain_or_ip, "github.io");
        assert_eq!(status.public_suffixes, vec!["github.io".to_string()]);
        assert!(matches!(status.error, Some(WhoisError::Internal(_))));
        assert!(record.is_none());
    }

    #[test]
    fn test_unset_status() {
        let status = Status::ip("192.0.2.1", None);
        assert!(status.resp_type.is_none());
        assert_eq!(status.outcome(), RespType::Error);
    }
}
