//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::loan::LoanService;
use crate::notification::{Mailer, NotificationService};
use crate::payment::PaymentService;
use crate::policy::PolicyService;
use crate::services::{UserService, WaitlistService};
use crate::trust::{PgTrustStore, TrustService};
use crate::vouch::VouchService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub token_verifier: Arc<TokenVerifier>,
    pub trust_service: Arc<TrustService>,
    pub policy_service: Arc<PolicyService>,
    pub vouch_service: Arc<VouchService>,
    pub loan_service: Arc<LoanService>,
    pub payment_service: Arc<PaymentService>,
    pub notification_service: Arc<NotificationService>,
    pub user_service: Arc<UserService>,
    pub waitlist_service: Arc<WaitlistService>,
    pub webhook_secret: Option<String>,
}

impl AppState {
    /// Wire every service onto one pool
    pub fn new(db_pool: PgPool, config: &Config) -> anyhow::Result<Self> {
        let mailer = config.mail.clone().map(Mailer::new).transpose()?;
        if mailer.is_none() {
            tracing::warn!("MAIL_API_URL not set, email relay disabled");
        }

        let notification_service = Arc::new(NotificationService::new(db_pool.clone(), mailer));
        let trust_service = Arc::new(TrustService::new(
            Arc::new(PgTrustStore::new(db_pool.clone())),
            config.tier_freshness_seconds,
        ));
        let policy_service = Arc::new(PolicyService::new(db_pool.clone()));

        let vouch_service = Arc::new(VouchService::new(
            db_pool.clone(),
            trust_service.clone(),
            notification_service.clone(),
        ));
        let loan_service = Arc::new(LoanService::new(
            db_pool.clone(),
            trust_service.clone(),
            policy_service.clone(),
            notification_service.clone(),
            config.invite_ttl_days,
            config.app_base_url.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            db_pool.clone(),
            notification_service.clone(),
        ));

        Ok(Self {
            token_verifier: Arc::new(TokenVerifier::new(config.jwt_secret.clone())),
            trust_service,
            policy_service,
            vouch_service,
            loan_service,
            payment_service,
            notification_service,
            user_service: Arc::new(UserService::new(db_pool.clone())),
            waitlist_service: Arc::new(WaitlistService::new(db_pool.clone())),
            webhook_secret: config.webhook_secret.clone(),
            db_pool,
        })
    }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_verifier.clone()
    }
}

impl FromRef<AppState> for Arc<TrustService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.trust_service.clone()
    }
}

impl FromRef<AppState> for Arc<PolicyService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.policy_service.clone()
    }
}

impl FromRef<AppState> for Arc<VouchService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.vouch_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_service.clone()
    }
}

impl FromRef<AppState> for Arc<NotificationService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.notification_service.clone()
    }
}

impl FromRef<AppState> for Arc<UserService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.user_service.clone()
    }
}

impl FromRef<AppState> for Arc<WaitlistService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.waitlist_service.clone()
    }
}
