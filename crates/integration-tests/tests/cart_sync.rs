//! Cart synchronizer scenarios: optimistic mutation, reconciliation, and
//! identity changes, driven against the in-memory kitchen.

use std::sync::Arc;
use std::time::Duration;

use quickbite_client::error::ApiError;
use quickbite_client::session::SessionStore;
use quickbite_client::sync::CartSynchronizer;
use quickbite_core::{CartLineId, FoodId, UserId};

use quickbite_integration_tests::{MockKitchen, customer, food};

fn setup() -> (Arc<SessionStore>, Arc<MockKitchen>, Arc<CartSynchronizer<MockKitchen>>) {
    let session = Arc::new(SessionStore::new());
    let kitchen = Arc::new(MockKitchen::new());
    kitchen.seed_menu(food(1, "Margherita", 100));
    kitchen.seed_menu(food(2, "Pad Thai", 50));
    let cart = Arc::new(CartSynchronizer::new(
        Arc::clone(&session),
        Arc::clone(&kitchen),
    ));
    (session, kitchen, cart)
}

#[tokio::test]
async fn refresh_replaces_snapshot_wholesale() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);
    kitchen.seed_cart_line(UserId::new(1), &food(2, "Pad Thai", 50), 1);

    cart.refresh().await.expect("refresh");

    let snapshot = cart.snapshot();
    assert_eq!(snapshot.lines.len(), 2);
    assert!(!snapshot.loading);
    assert!(snapshot.last_error.is_none());
    assert_eq!(snapshot.lines, kitchen.server_cart(UserId::new(1)));
}

#[tokio::test]
async fn refresh_without_identity_is_empty_not_an_error() {
    let (_session, kitchen, cart) = setup();

    cart.refresh().await.expect("refresh while logged out");

    assert!(cart.snapshot().is_empty());
    assert_eq!(kitchen.calls("fetch_cart"), 0);
}

#[tokio::test]
async fn add_trusts_server_issued_line() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));

    cart.add(&food(1, "Margherita", 100), 2).await.expect("add");

    let snapshot = cart.snapshot();
    assert_eq!(snapshot.lines.len(), 1);
    let line = snapshot.lines.first().expect("line");
    assert_eq!(line.food_id, FoodId::new(1));
    assert_eq!(line.quantity, 2);
    // the line carries the server-issued id, not a locally synthesized one
    assert_eq!(line.cart_id, kitchen.server_cart(UserId::new(1))[0].cart_id);
    // the authoritative re-fetch happened
    assert_eq!(kitchen.calls("fetch_cart"), 1);
}

#[tokio::test]
async fn invalid_add_is_rejected_without_network() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));

    let err = cart.add(&food(1, "Margherita", 100), 0).await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationRejected(_)));

    let err = cart.add(&food(0, "Ghost", 10), 5).await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationRejected(_)));

    assert_eq!(kitchen.calls("add_cart_line"), 0);
    assert_eq!(kitchen.calls("fetch_cart"), 0);
}

#[tokio::test]
async fn add_failure_leaves_snapshot_unchanged() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);
    cart.refresh().await.expect("refresh");

    kitchen.fail_next(
        "add_cart_line",
        ApiError::rejected("kitchen closed"),
    );
    let err = cart.add(&food(2, "Pad Thai", 50), 1).await.unwrap_err();
    assert!(matches!(err, ApiError::ServerRejected { .. }));

    let snapshot = cart.snapshot();
    assert_eq!(snapshot.lines.len(), 1);
    assert_eq!(kitchen.calls("fetch_cart"), 1); // only the initial refresh
}

#[tokio::test]
async fn update_quantity_is_optimistic_then_confirmed() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    let cart_id = kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);
    cart.refresh().await.expect("refresh");

    kitchen.stall("update_cart_line", Duration::from_millis(50));
    let task = {
        let cart = Arc::clone(&cart);
        tokio::spawn(async move { cart.update_quantity(cart_id, 3).await })
    };

    // the optimistic value is visible while the network call is in flight
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(cart.snapshot().lines[0].quantity, 3);

    task.await.expect("join").expect("update");

    // and still there after the ack, with no extra fetch
    assert_eq!(cart.snapshot().lines[0].quantity, 3);
    assert_eq!(kitchen.server_cart(UserId::new(1))[0].quantity, 3);
    assert_eq!(kitchen.calls("fetch_cart"), 1);
}

#[tokio::test]
async fn update_to_zero_is_a_removal() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    let cart_id = kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);
    cart.refresh().await.expect("refresh");

    cart.update_quantity(cart_id, 0).await.expect("update to zero");

    assert!(cart.snapshot().is_empty());
    assert!(kitchen.server_cart(UserId::new(1)).is_empty());
    // collapsed into the delete operation, never an update
    assert_eq!(kitchen.calls("update_cart_line"), 0);
    assert_eq!(kitchen.calls("delete_cart_line"), 1);
}

#[tokio::test]
async fn failed_update_reconciles_to_server_truth() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    let cart_id = kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);
    cart.refresh().await.expect("refresh");

    kitchen.fail_next(
        "update_cart_line",
        ApiError::NetworkUnreachable("connection reset".to_string()),
    );
    let err = cart.update_quantity(cart_id, 3).await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkUnreachable(_)));

    // the optimistic value was discarded by a forced reload
    let snapshot = cart.snapshot();
    assert_eq!(snapshot.lines[0].quantity, 2);
    assert_eq!(kitchen.calls("fetch_cart"), 2);
}

#[tokio::test]
async fn failed_removal_restores_the_line() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    let cart_id = kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);
    cart.refresh().await.expect("refresh");

    kitchen.fail_next(
        "delete_cart_line",
        ApiError::NetworkUnreachable("timeout".to_string()),
    );
    cart.remove(cart_id).await.unwrap_err();

    // never left locally removed while still present server-side
    assert_eq!(cart.snapshot().lines.len(), 1);
    assert_eq!(kitchen.server_cart(UserId::new(1)).len(), 1);
}

#[tokio::test]
async fn removing_a_line_the_server_lost_reconciles() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);
    cart.refresh().await.expect("refresh");

    // the line disappeared server-side in the meantime
    let err = cart.remove(CartLineId::new(999)).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // the snapshot settled on server truth either way
    assert_eq!(cart.snapshot().lines, kitchen.server_cart(UserId::new(1)));
}

#[tokio::test]
async fn mutation_sequence_leaves_no_drift_after_refresh() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));

    cart.add(&food(1, "Margherita", 100), 2).await.expect("add");
    cart.add(&food(2, "Pad Thai", 50), 1).await.expect("add");
    let first = cart.snapshot().lines[0].cart_id;
    cart.update_quantity(first, 5).await.expect("update");
    let second = cart.snapshot().lines[1].cart_id;
    cart.remove(second).await.expect("remove");

    cart.refresh().await.expect("refresh");

    assert_eq!(cart.snapshot().lines, kitchen.server_cart(UserId::new(1)));
}

#[tokio::test]
async fn switching_identity_clears_the_snapshot_immediately() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);
    cart.refresh().await.expect("refresh");
    assert_eq!(cart.snapshot().lines.len(), 1);

    // no fetch needed: user 1's lines must not be visible as user 2's
    session.login(customer(2));
    assert!(cart.snapshot().is_empty());

    cart.refresh().await.expect("refresh as user 2");
    assert!(cart.snapshot().is_empty());
}

#[tokio::test]
async fn response_arriving_after_identity_change_is_discarded() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);

    kitchen.stall("fetch_cart", Duration::from_millis(50));
    let task = {
        let cart = Arc::clone(&cart);
        tokio::spawn(async move { cart.refresh().await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    session.login(customer(2));

    task.await.expect("join").expect("refresh settles ok");

    // user 1's cart never surfaces under user 2's session
    assert!(cart.snapshot().is_empty());
}

#[tokio::test]
async fn unauthenticated_response_requests_logout() {
    let (session, kitchen, cart) = setup();
    session.login(customer(1));
    let cart_id = kitchen.seed_cart_line(UserId::new(1), &food(1, "Margherita", 100), 2);
    cart.refresh().await.expect("refresh");

    kitchen.fail_next("update_cart_line", ApiError::Unauthenticated);
    let err = cart.update_quantity(cart_id, 3).await.unwrap_err();
    assert!(err.is_unauthenticated());

    // the synchronizer asked the session store for a logout transition
    assert!(session.identity().is_none());
    assert!(cart.snapshot().is_empty());
}
