use cucumber::given;
use storefront_engine::traits::EntitlementOrdering;

use crate::cucumber::{world::StoreSystem, StoreWorld};

#[given("a storefront with the standard catalog")]
async fn fresh_storefront(world: &mut StoreWorld) {
    let system = StoreSystem::new().await;
    world.system = Some(system);
}

#[given("the storefront grants entitlements before checking the amount")]
async fn legacy_ordering(world: &mut StoreWorld) {
    world.system_mut().use_ordering(EntitlementOrdering::BeforeAmountCheck);
}
