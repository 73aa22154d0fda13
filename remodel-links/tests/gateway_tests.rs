use futures::StreamExt;
use pretty_assertions::assert_eq;
use remodel_links::{
    timeout_value, AddressResolver, GatewayConfig, InMemoryConnector, InMemoryLinkService,
    LinkDirectory, LinkError, RelationLink, RelationshipGateway, ResolvedAddress, ResolverConfig,
    TimeUnit, UpdateLinkRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn address() -> ResolvedAddress {
    ResolvedAddress {
        host: "shops-addresses".to_string(),
        port: 50051,
    }
}

fn gateway_over(service: Arc<InMemoryLinkService>) -> RelationshipGateway {
    RelationshipGateway::new(address(), service, GatewayConfig::default())
}

fn directory(connector: Arc<InMemoryConnector>) -> LinkDirectory {
    let resolver = AddressResolver::with_lookup(ResolverConfig::default(), HashMap::new());
    LinkDirectory::new(resolver, connector)
}

// ── Link operations ──────────────────────────────────────────────

#[tokio::test]
async fn create_then_list_links() {
    let service = Arc::new(InMemoryLinkService::new());
    let gateway = gateway_over(service.clone());

    gateway.create_link("1", "10").await.unwrap();
    gateway.create_link("1", "11").await.unwrap();
    gateway.create_link("2", "12").await.unwrap();

    let links: Vec<RelationLink> = gateway
        .list_links_by_left("1")
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(
        links,
        vec![RelationLink::new("1", "10"), RelationLink::new("1", "11")]
    );
    assert_eq!(gateway.linked_right_ids("2").await.unwrap(), vec!["12"]);
}

#[tokio::test]
async fn create_is_idempotent() {
    let service = Arc::new(InMemoryLinkService::new());
    let gateway = gateway_over(service.clone());

    gateway.create_link("1", "10").await.unwrap();
    gateway.create_link("1", "10").await.unwrap();
    assert_eq!(service.links().len(), 1);
}

#[tokio::test]
async fn list_for_unknown_left_is_empty() {
    let gateway = gateway_over(Arc::new(InMemoryLinkService::new()));
    assert!(gateway.linked_right_ids("404").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_replaces_link() {
    let service = Arc::new(InMemoryLinkService::with_links([RelationLink::new("1", "10")]));
    let gateway = gateway_over(service.clone());

    gateway
        .update_link(UpdateLinkRequest {
            current: RelationLink::new("1", "10"),
            replacement: RelationLink::new("1", "20"),
        })
        .await
        .unwrap();
    assert_eq!(service.links(), vec![RelationLink::new("1", "20")]);
}

#[tokio::test]
async fn update_missing_link_is_not_found() {
    let gateway = gateway_over(Arc::new(InMemoryLinkService::new()));
    let result = gateway
        .update_link(UpdateLinkRequest {
            current: RelationLink::new("1", "10"),
            replacement: RelationLink::new("1", "20"),
        })
        .await;
    assert!(matches!(result, Err(LinkError::NotFound(_))));
}

#[tokio::test]
async fn delete_removes_link() {
    let service = Arc::new(InMemoryLinkService::with_links([
        RelationLink::new("1", "10"),
        RelationLink::new("1", "11"),
    ]));
    let gateway = gateway_over(service.clone());

    gateway.delete_link("1", "10").await.unwrap();
    assert_eq!(service.links(), vec![RelationLink::new("1", "11")]);

    let again = gateway.delete_link("1", "10").await;
    assert!(matches!(again, Err(LinkError::NotFound(_))));
}

// ── Errors ───────────────────────────────────────────────────────

#[tokio::test]
async fn empty_ids_are_rejected_before_rpc() {
    let service = Arc::new(InMemoryLinkService::new());
    let gateway = gateway_over(service.clone());

    assert!(matches!(
        gateway.create_link("", "10").await,
        Err(LinkError::InvalidArgument(_))
    ));
    assert!(matches!(
        gateway.list_links_by_left("").await,
        Err(LinkError::InvalidArgument(_))
    ));
    assert_eq!(service.call_count(), 0);
}

#[tokio::test]
async fn service_errors_are_returned() {
    let service = Arc::new(InMemoryLinkService::new());
    service.set_failure(Some(LinkError::Unavailable {
        address: address().to_string(),
        reason: "down".to_string(),
    }));
    let gateway = gateway_over(service.clone());

    let result = gateway.create_link("1", "10").await;
    assert!(matches!(result, Err(LinkError::Unavailable { .. })));
    assert!(service.links().is_empty());

    service.set_failure(None);
    gateway.create_link("1", "10").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn deadline_bounds_each_rpc() {
    let service = Arc::new(InMemoryLinkService::new());
    service.set_latency(Some(Duration::from_secs(5)));
    let gateway = RelationshipGateway::new(
        address(),
        service,
        GatewayConfig {
            rpc_deadline: Some(Duration::from_millis(250)),
        },
    );

    let result = gateway.create_link("1", "10").await;
    assert_eq!(
        result,
        Err(LinkError::DeadlineExceeded {
            method: "CreateRelationship".to_string(),
            deadline_ms: 250,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn no_deadline_waits_for_slow_service() {
    let service = Arc::new(InMemoryLinkService::new());
    service.set_latency(Some(Duration::from_secs(5)));
    let gateway = gateway_over(service.clone());

    gateway.create_link("1", "10").await.unwrap();
    assert_eq!(service.links().len(), 1);
}

// ── Directory ────────────────────────────────────────────────────

#[tokio::test]
async fn directory_connects_to_resolved_address() {
    let connector = Arc::new(InMemoryConnector::new());
    let directory = directory(connector.clone());

    let gateway = directory.gateway("shops", "addresses").unwrap();
    assert_eq!(gateway.address(), &address());
    gateway.create_link("1", "10").await.unwrap();

    assert_eq!(connector.connections(), vec![address()]);
    assert_eq!(
        connector.service(&address()).links(),
        vec![RelationLink::new("1", "10")]
    );
}

#[tokio::test]
async fn directory_shares_service_per_address() {
    let connector = Arc::new(InMemoryConnector::new());
    let directory = directory(connector.clone());

    directory
        .gateway("shops", "addresses")
        .unwrap()
        .create_link("1", "10")
        .await
        .unwrap();
    let ids = directory
        .gateway("shops", "addresses")
        .unwrap()
        .linked_right_ids("1")
        .await
        .unwrap();
    assert_eq!(ids, vec!["10"]);
}

#[test]
fn directory_reports_unreachable_service() {
    let connector = Arc::new(InMemoryConnector::new());
    connector.mark_unreachable("shops-addresses");
    let result = directory(connector).gateway("shops", "addresses");
    assert!(matches!(result, Err(LinkError::Unavailable { .. })));
}

// ── Time units ───────────────────────────────────────────────────

#[test]
fn timeout_values_per_unit() {
    assert_eq!(timeout_value(2, TimeUnit::Milliseconds), 2 * 1000);
    assert_eq!(timeout_value(2, TimeUnit::Microseconds), 2 * 1000 * 1000);
    assert_eq!(timeout_value(2, TimeUnit::Nanoseconds), 2 * 1000 * 1000 * 1000);
}

#[test]
fn time_unit_parsing() {
    assert_eq!("ms".parse::<TimeUnit>().unwrap(), TimeUnit::Milliseconds);
    assert_eq!("µs".parse::<TimeUnit>().unwrap(), TimeUnit::Microseconds);
    assert_eq!("us".parse::<TimeUnit>().unwrap(), TimeUnit::Microseconds);
    assert_eq!("ns".parse::<TimeUnit>().unwrap(), TimeUnit::Nanoseconds);
    assert_eq!(
        "fortnights".parse::<TimeUnit>(),
        Err(LinkError::InvalidTimeUnit("fortnights".to_string()))
    );
    assert_eq!(TimeUnit::default(), TimeUnit::Microseconds);
}

#[test]
fn time_unit_of_duration() {
    let d = Duration::from_millis(1500);
    assert_eq!(TimeUnit::Milliseconds.of(d), 1500);
    assert_eq!(TimeUnit::Microseconds.of(d), 1_500_000);
    assert_eq!(TimeUnit::Microseconds.suffix(), "µs");
}
