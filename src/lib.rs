pub mod billing {
    pub mod ledger;
    pub mod retry_policy;
    pub mod state_machine;
}
pub mod config;
pub mod domain {
    pub mod billing_log;
    pub mod payment_intent;
    pub mod subscription;
}
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod payment_intents;
        pub mod subscriptions;
    }
    pub mod middleware {
        pub mod admin_auth;
    }
    pub mod router;
}
pub mod lock;
pub mod repo {
    pub mod memory_store;
    pub mod subscription_logs_repo;
    pub mod subscription_store;
    pub mod subscriptions_repo;
}
pub mod service {
    pub mod rebilling_scheduler;
    pub mod rebilling_trigger;
}

#[derive(Clone)]
pub struct AppState {
    pub subscriptions_repo: repo::subscriptions_repo::SubscriptionsRepo,
    pub subscription_logs_repo: repo::subscription_logs_repo::SubscriptionLogsRepo,
    pub trigger: service::rebilling_trigger::RebillingTrigger<repo::subscriptions_repo::SubscriptionsRepo>,
    pub redis_client: redis::Client,
}
