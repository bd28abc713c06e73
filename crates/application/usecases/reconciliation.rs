use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use crate::{
    application::{
        gateways::{AlertSink, CommissionRateSource, PaymentProviderGateway},
        usecases::settlement::SettlementService,
    },
    domain::{
        repositories::{
            bookings::BookingRepository, card_holds::CardHoldRepository, dlq::DlqRepository,
            payment_intents::PaymentIntentRepository, wallets::WalletRepository,
        },
        value_objects::{
            alerts::{AlertPayload, AlertSeverity},
            enums::{
                booking_statuses::BookingStatus, card_hold_statuses::CardHoldStatus,
                dlq_statuses::DlqStatus,
            },
            money::round2,
            reconciliation::{
                CheckStatus, OverallStatus, ReconciliationReport, ReconciliationResult,
            },
        },
    },
};

pub const MAX_ITEMS_PER_CHECK: i64 = 20;
const PROVIDER_CALL_DELAY_MS: u64 = 200;
const STALE_INTENT_AGE_HOURS: i64 = 1;
const WALLET_DRIFT_TOLERANCE_USD: f64 = 0.01;
const DLQ_PENDING_BACKLOG_THRESHOLD: i64 = 50;
const DLQ_FAILED_BACKLOG_THRESHOLD: i64 = 10;
const MIN_AUDITABLE_AMOUNT_USD: f64 = 10.0;
const DEFAULT_COMMISSION_RATE: f64 = 0.15;

/// Nightly sweep over the payment records. Each check compares our state with
/// the provider's (or with itself) and, when `autofix` is on, repairs what can
/// be repaired safely. Wallet drift is only ever reported.
pub struct ReconciliationUseCase<B, I, W, H, D, G, C, A>
where
    B: BookingRepository + Send + Sync + 'static,
    I: PaymentIntentRepository + Send + Sync + 'static,
    W: WalletRepository + Send + Sync + 'static,
    H: CardHoldRepository + Send + Sync + 'static,
    D: DlqRepository + Send + Sync + 'static,
    G: PaymentProviderGateway + Send + Sync + 'static,
    C: CommissionRateSource + Send + Sync + 'static,
    A: AlertSink + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    intent_repo: Arc<I>,
    wallet_repo: Arc<W>,
    card_hold_repo: Arc<H>,
    dlq_repo: Arc<D>,
    provider: Arc<G>,
    commission_source: Arc<C>,
    alerts: Arc<A>,
    settlement: SettlementService<B, I>,
}

impl<B, I, W, H, D, G, C, A> ReconciliationUseCase<B, I, W, H, D, G, C, A>
where
    B: BookingRepository + Send + Sync + 'static,
    I: PaymentIntentRepository + Send + Sync + 'static,
    W: WalletRepository + Send + Sync + 'static,
    H: CardHoldRepository + Send + Sync + 'static,
    D: DlqRepository + Send + Sync + 'static,
    G: PaymentProviderGateway + Send + Sync + 'static,
    C: CommissionRateSource + Send + Sync + 'static,
    A: AlertSink + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        booking_repo: Arc<B>,
        intent_repo: Arc<I>,
        wallet_repo: Arc<W>,
        card_hold_repo: Arc<H>,
        dlq_repo: Arc<D>,
        provider: Arc<G>,
        commission_source: Arc<C>,
        alerts: Arc<A>,
    ) -> Self {
        let settlement =
            SettlementService::new(Arc::clone(&booking_repo), Arc::clone(&intent_repo));
        Self {
            booking_repo,
            intent_repo,
            wallet_repo,
            card_hold_repo,
            dlq_repo,
            provider,
            commission_source,
            alerts,
            settlement,
        }
    }

    pub async fn run(&self, autofix: bool, window_days: i64) -> Result<ReconciliationReport> {
        let ran_at = Utc::now();
        let since = ran_at - Duration::days(window_days);
        info!(autofix, window_days, "reconciliation: sweep starting");

        // A failing check never aborts the sweep; it lands in the report as
        // an errored result instead.
        let mut checks = Vec::with_capacity(7);
        checks.push(
            self.check_pending_bookings(autofix, since)
                .await
                .unwrap_or_else(|err| errored("pending_bookings", err)),
        );
        checks.push(
            self.check_stale_intents(autofix, since)
                .await
                .unwrap_or_else(|err| errored("stale_intents", err)),
        );
        checks.push(
            self.check_downgraded_payments(autofix, since)
                .await
                .unwrap_or_else(|err| errored("downgraded_payments", err)),
        );
        checks.push(
            self.check_expired_holds(autofix)
                .await
                .unwrap_or_else(|err| errored("expired_holds", err)),
        );
        checks.push(
            self.check_wallet_drift()
                .await
                .unwrap_or_else(|err| errored("wallet_drift", err)),
        );
        checks.push(
            self.check_dlq_backlog()
                .await
                .unwrap_or_else(|err| errored("dlq_backlog", err)),
        );
        checks.push(
            self.check_commissions(since)
                .await
                .unwrap_or_else(|err| errored("commission_audit", err)),
        );

        let total_issues: i64 = checks.iter().map(|c| c.issues_found).sum();
        let total_fixed: i64 = checks.iter().map(|c| c.issues_fixed).sum();
        let overall_status = ReconciliationReport::overall_status_for(&checks);

        let report = ReconciliationReport {
            ran_at,
            window_days,
            autofix,
            checks,
            total_issues,
            total_fixed,
            overall_status,
        };

        info!(
            overall_status = %report.overall_status,
            total_issues,
            total_fixed,
            "reconciliation: sweep finished"
        );

        if report.overall_status == OverallStatus::Critical {
            self.alert_critical(&report).await;
        }

        Ok(report)
    }

    /// Bookings stuck in pending_payment whose payment the provider has in
    /// fact approved, usually a lost webhook.
    async fn check_pending_bookings(
        &self,
        autofix: bool,
        since: chrono::DateTime<Utc>,
    ) -> Result<ReconciliationResult> {
        let bookings = self
            .booking_repo
            .list_by_status_since(BookingStatus::PendingPayment, since, MAX_ITEMS_PER_CHECK)
            .await?;

        let mut result = ReconciliationResult::passed("pending_bookings");
        for booking in bookings {
            self.throttle().await;
            let payments = self
                .provider
                .search_payments_by_booking_id(booking.id)
                .await?;
            let Some(approved) = payments.into_iter().find(|p| p.is_approved()) else {
                continue;
            };

            result.issues_found += 1;
            result.details.push(format!(
                "booking {} pending but payment {} approved at the provider",
                booking.id, approved.id
            ));

            if autofix {
                let outcome = self
                    .settlement
                    .apply_approved_payment(booking.id, Some(approved.id))
                    .await?;
                if outcome.booking_confirmed {
                    result.issues_fixed += 1;
                }
            }
        }

        if result.issues_found > 0 {
            result.status = CheckStatus::Issues;
        }
        Ok(result)
    }

    /// Intents that stayed pending past the checkout session lifetime. The
    /// provider is asked for the final verdict on each.
    async fn check_stale_intents(
        &self,
        autofix: bool,
        since: chrono::DateTime<Utc>,
    ) -> Result<ReconciliationResult> {
        let cutoff = Utc::now() - Duration::hours(STALE_INTENT_AGE_HOURS);
        let intents = self
            .intent_repo
            .list_pending_older_than(cutoff, since, MAX_ITEMS_PER_CHECK)
            .await?;

        let mut result = ReconciliationResult::passed("stale_intents");
        for intent in intents {
            self.throttle().await;
            let payment = match intent.provider_payment_id.as_deref() {
                Some(payment_id) => Some(self.provider.get_payment(payment_id).await?),
                None => self
                    .provider
                    .search_payments_by_booking_id(intent.booking_id)
                    .await?
                    .into_iter()
                    .find(|p| p.is_approved() || p.is_rejected()),
            };

            result.issues_found += 1;
            match payment {
                Some(payment) if payment.is_approved() => {
                    result.details.push(format!(
                        "intent {} stale but approved at the provider",
                        intent.id
                    ));
                    if autofix {
                        self.settlement
                            .apply_approved_payment(intent.booking_id, Some(payment.id))
                            .await?;
                        result.issues_fixed += 1;
                    }
                }
                Some(payment) if payment.is_rejected() => {
                    result.details.push(format!(
                        "intent {} stale and rejected at the provider",
                        intent.id
                    ));
                    if autofix {
                        let reason = payment
                            .status_detail
                            .unwrap_or_else(|| "rejected".to_string());
                        self.intent_repo.mark_failed(intent.id, reason).await?;
                        result.issues_fixed += 1;
                    }
                }
                _ => {
                    result.details.push(format!(
                        "intent {} stale with no settled provider payment",
                        intent.id
                    ));
                }
            }
        }

        if result.issues_found > 0 {
            result.status = CheckStatus::Issues;
        }
        Ok(result)
    }

    /// Completed intents whose provider payment was later cancelled or
    /// rejected, usually a manual cancellation or chargeback on the provider
    /// side after we already settled.
    async fn check_downgraded_payments(
        &self,
        autofix: bool,
        since: chrono::DateTime<Utc>,
    ) -> Result<ReconciliationResult> {
        let intents = self
            .intent_repo
            .list_completed_since(since, MAX_ITEMS_PER_CHECK)
            .await?;

        let mut result = ReconciliationResult::passed("downgraded_payments");
        for intent in intents {
            let Some(payment_id) = intent.provider_payment_id.as_deref() else {
                continue;
            };
            self.throttle().await;
            let payment = self.provider.get_payment(payment_id).await?;
            if !(payment.is_rejected() || payment.is_cancelled()) {
                continue;
            }

            result.issues_found += 1;
            result.details.push(format!(
                "intent {} completed locally but {} at the provider",
                intent.id, payment.status
            ));

            if autofix {
                let reason = payment
                    .status_detail
                    .unwrap_or_else(|| payment.status.clone());
                self.intent_repo.mark_failed(intent.id, reason).await?;
                result.issues_fixed += 1;
            }
        }

        if result.issues_found > 0 {
            result.status = CheckStatus::Issues;
        }
        Ok(result)
    }

    /// Active guarantee holds past their validity window.
    async fn check_expired_holds(&self, autofix: bool) -> Result<ReconciliationResult> {
        let holds = self
            .card_hold_repo
            .list_expired_active(Utc::now(), MAX_ITEMS_PER_CHECK)
            .await?;

        let mut result = ReconciliationResult::passed("expired_holds");
        for hold in holds {
            result.issues_found += 1;
            result.details.push(format!(
                "hold {} for booking {} expired {}",
                hold.id, hold.booking_id, hold.expires_at
            ));

            if autofix {
                self.throttle().await;
                if let Err(err) = self.provider.cancel_hold(&hold.provider_hold_id).await {
                    warn!(
                        hold_id = %hold.id,
                        error = ?err,
                        "reconciliation: provider refused to cancel expired hold"
                    );
                    continue;
                }
                let transitioned = self
                    .card_hold_repo
                    .transition_status(hold.id, CardHoldStatus::Active, CardHoldStatus::Expired)
                    .await?;
                if transitioned {
                    result.issues_fixed += 1;
                }
            }
        }

        if result.issues_found > 0 {
            result.status = CheckStatus::Issues;
        }
        Ok(result)
    }

    /// The stored wallet balance must equal the sum of the ledger. A drift is
    /// reported and left for a human; no automatic repair is safe here.
    async fn check_wallet_drift(&self) -> Result<ReconciliationResult> {
        let wallets = self.wallet_repo.list_wallets(MAX_ITEMS_PER_CHECK).await?;

        let mut result = ReconciliationResult::passed("wallet_drift");
        for wallet in wallets {
            let ledger_usd = self.wallet_repo.sum_ledger_cents(wallet.id).await? as f64 / 100.0;
            let drift = (ledger_usd - wallet.balance_usd).abs();
            if drift > WALLET_DRIFT_TOLERANCE_USD {
                result.issues_found += 1;
                result.details.push(format!(
                    "wallet {} balance {} diverges from ledger sum {}",
                    wallet.id,
                    wallet.balance_usd,
                    round2(ledger_usd)
                ));
            }
        }

        if result.issues_found > 0 {
            result.status = CheckStatus::Issues;
        }
        Ok(result)
    }

    /// The dead-letter queue normally drains itself; a growing backlog means
    /// the processor is stuck or the provider is down.
    async fn check_dlq_backlog(&self) -> Result<ReconciliationResult> {
        let pending = self.dlq_repo.count_by_status(DlqStatus::Pending).await?;
        let failed = self.dlq_repo.count_by_status(DlqStatus::Failed).await?;

        let mut result = ReconciliationResult::passed("dlq_backlog");
        if pending > DLQ_PENDING_BACKLOG_THRESHOLD {
            result.issues_found += 1;
            result
                .details
                .push(format!("{pending} pending dead-letter items"));
        }
        if failed > DLQ_FAILED_BACKLOG_THRESHOLD {
            result.issues_found += 1;
            result
                .details
                .push(format!("{failed} permanently failed dead-letter items"));
        }

        if result.issues_found > 0 {
            result.status = CheckStatus::Issues;
        }
        Ok(result)
    }

    /// Audits the commission recorded on completed intents against the
    /// expected marketplace rate, within 1% of the expected fee.
    async fn check_commissions(
        &self,
        since: chrono::DateTime<Utc>,
    ) -> Result<ReconciliationResult> {
        let rate = match self.commission_source.expected_rate().await {
            Ok(rate) => rate,
            Err(err) => {
                warn!(
                    error = ?err,
                    fallback_rate = DEFAULT_COMMISSION_RATE,
                    "reconciliation: commission rate source unavailable, using fallback"
                );
                DEFAULT_COMMISSION_RATE
            }
        };

        let intents = self
            .intent_repo
            .list_completed_since(since, MAX_ITEMS_PER_CHECK)
            .await?;

        let mut result = ReconciliationResult::passed("commission_audit");
        for intent in intents {
            let expected_fee = round2(intent.amount_usd * rate);
            match intent.commission_fee_usd {
                None => {
                    // A missing fee is flagged regardless of the amount.
                    result.issues_found += 1;
                    result.details.push(format!(
                        "intent {} completed without a commission fee",
                        intent.id
                    ));
                }
                Some(fee) => {
                    // Rate deviations below the auditable floor are rounding
                    // noise.
                    if intent.amount_usd < MIN_AUDITABLE_AMOUNT_USD {
                        continue;
                    }
                    let tolerance = (expected_fee * 0.01).max(0.01);
                    if (fee - expected_fee).abs() > tolerance {
                        result.issues_found += 1;
                        result.details.push(format!(
                            "intent {} commission {} deviates from expected {}",
                            intent.id, fee, expected_fee
                        ));
                    }
                }
            }
        }

        if result.issues_found > 0 {
            result.status = CheckStatus::Issues;
        }
        Ok(result)
    }

    async fn alert_critical(&self, report: &ReconciliationReport) {
        let alert = AlertPayload::new(
            AlertSeverity::Critical,
            "reconciliation",
            "sweep_critical",
            format!(
                "reconciliation sweep critical: {} issues, {} fixed",
                report.total_issues, report.total_fixed
            ),
            serde_json::to_value(report).unwrap_or_default(),
        );
        if let Err(err) = self.alerts.send(alert).await {
            error!(error = ?err, "reconciliation: failed to send critical alert");
        }
    }

    // Keeps the sweep inside the provider's rate limits.
    async fn throttle(&self) {
        tokio::time::sleep(StdDuration::from_millis(PROVIDER_CALL_DELAY_MS)).await;
    }
}

fn errored(check: &str, err: anyhow::Error) -> ReconciliationResult {
    error!(check, error = ?err, "reconciliation: check failed");
    ReconciliationResult::errored(check, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gateways::{
        MockAlertSink, MockCommissionRateSource, MockPaymentProviderGateway,
    };
    use crate::domain::entities::bookings::BookingEntity;
    use crate::domain::entities::wallets::WalletEntity;
    use crate::domain::repositories::{
        bookings::MockBookingRepository, card_holds::MockCardHoldRepository,
        dlq::MockDlqRepository, payment_intents::MockPaymentIntentRepository,
        wallets::MockWalletRepository,
    };
    use crate::domain::value_objects::provider::ProviderPayment;
    use mockall::predicate::eq;
    use uuid::Uuid;

    struct Mocks {
        booking_repo: MockBookingRepository,
        intent_repo: MockPaymentIntentRepository,
        wallet_repo: MockWalletRepository,
        card_hold_repo: MockCardHoldRepository,
        dlq_repo: MockDlqRepository,
        provider: MockPaymentProviderGateway,
        commission_source: MockCommissionRateSource,
        alerts: MockAlertSink,
    }

    impl Mocks {
        /// Every check sees an empty, healthy system unless a test overrides
        /// an expectation before calling `build`.
        fn healthy() -> Self {
            let mut mocks = Self {
                booking_repo: MockBookingRepository::new(),
                intent_repo: MockPaymentIntentRepository::new(),
                wallet_repo: MockWalletRepository::new(),
                card_hold_repo: MockCardHoldRepository::new(),
                dlq_repo: MockDlqRepository::new(),
                provider: MockPaymentProviderGateway::new(),
                commission_source: MockCommissionRateSource::new(),
                alerts: MockAlertSink::new(),
            };
            mocks
                .booking_repo
                .expect_list_by_status_since()
                .returning(|_, _, _| Box::pin(async { Ok(vec![]) }));
            mocks
                .intent_repo
                .expect_list_pending_older_than()
                .returning(|_, _, _| Box::pin(async { Ok(vec![]) }));
            mocks
                .intent_repo
                .expect_list_completed_since()
                .returning(|_, _| Box::pin(async { Ok(vec![]) }));
            mocks
                .card_hold_repo
                .expect_list_expired_active()
                .returning(|_, _| Box::pin(async { Ok(vec![]) }));
            mocks
                .wallet_repo
                .expect_list_wallets()
                .returning(|_| Box::pin(async { Ok(vec![]) }));
            mocks
                .dlq_repo
                .expect_count_by_status()
                .returning(|_| Box::pin(async { Ok(0) }));
            mocks
                .commission_source
                .expect_expected_rate()
                .returning(|| Box::pin(async { Ok(0.15) }));
            mocks
        }

        fn build(
            self,
        ) -> ReconciliationUseCase<
            MockBookingRepository,
            MockPaymentIntentRepository,
            MockWalletRepository,
            MockCardHoldRepository,
            MockDlqRepository,
            MockPaymentProviderGateway,
            MockCommissionRateSource,
            MockAlertSink,
        > {
            ReconciliationUseCase::new(
                Arc::new(self.booking_repo),
                Arc::new(self.intent_repo),
                Arc::new(self.wallet_repo),
                Arc::new(self.card_hold_repo),
                Arc::new(self.dlq_repo),
                Arc::new(self.provider),
                Arc::new(self.commission_source),
                Arc::new(self.alerts),
            )
        }
    }

    fn completed_intent(
        amount_usd: f64,
        commission_fee_usd: Option<f64>,
    ) -> crate::domain::entities::payment_intents::PaymentIntentEntity {
        let now = Utc::now();
        crate::domain::entities::payment_intents::PaymentIntentEntity {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            provider: "mercadopago".to_string(),
            provider_payment_id: None,
            method: "card".to_string(),
            status: "completed".to_string(),
            amount_usd,
            amount_ars: amount_usd * 1000.0,
            fx_rate: 1000.0,
            commission_fee_usd,
            redirect_url: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn pending_booking(id: Uuid) -> BookingEntity {
        let now = Utc::now();
        BookingEntity {
            id,
            renter_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            status: "pending_payment".to_string(),
            payment_method: Some("card".to_string()),
            total_amount_usd: 500.0,
            currency: "USD".to_string(),
            wallet_amount_cents: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn healthy_system_reports_all_checks_passed() {
        let usecase = Mocks::healthy().build();
        let report = usecase.run(false, 7).await.unwrap();

        assert_eq!(report.overall_status, OverallStatus::Healthy);
        assert_eq!(report.checks.len(), 7);
        assert!(report.checks.iter().all(|c| c.status == CheckStatus::Passed));
        assert_eq!(report.total_issues, 0);
    }

    #[tokio::test]
    async fn pending_booking_with_approved_payment_is_autofixed() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::healthy();

        mocks.booking_repo = MockBookingRepository::new();
        mocks
            .booking_repo
            .expect_list_by_status_since()
            .returning(move |_, _, _| {
                let booking = pending_booking(booking_id);
                Box::pin(async move { Ok(vec![booking]) })
            });
        mocks
            .booking_repo
            .expect_transition_status()
            .with(
                eq(booking_id),
                eq(BookingStatus::PendingPayment),
                eq(BookingStatus::Confirmed),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(true) }));

        mocks
            .provider
            .expect_search_payments_by_booking_id()
            .with(eq(booking_id))
            .returning(move |_| {
                Box::pin(async move {
                    Ok(vec![ProviderPayment {
                        id: "mp-1".to_string(),
                        status: "approved".to_string(),
                        status_detail: None,
                        external_reference: Some(booking_id.to_string()),
                        transaction_amount: Some(500_000.0),
                        date_approved: Some(Utc::now()),
                    }])
                })
            });
        mocks
            .intent_repo
            .expect_find_by_provider_payment_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        mocks
            .intent_repo
            .expect_find_by_booking_id()
            .returning(|_| Box::pin(async { Ok(vec![]) }));

        let usecase = mocks.build();
        let report = usecase.run(true, 7).await.unwrap();

        let check = &report.checks[0];
        assert_eq!(check.check, "pending_bookings");
        assert_eq!(check.issues_found, 1);
        assert_eq!(check.issues_fixed, 1);
        assert_eq!(report.overall_status, OverallStatus::Degraded);
    }

    #[tokio::test]
    async fn wallet_drift_is_reported_but_never_fixed() {
        let mut mocks = Mocks::healthy();
        let wallet_id = Uuid::new_v4();

        mocks.wallet_repo = MockWalletRepository::new();
        mocks.wallet_repo.expect_list_wallets().returning(move |_| {
            let now = Utc::now();
            let wallet = WalletEntity {
                id: wallet_id,
                user_id: Uuid::new_v4(),
                balance_usd: 150.0,
                protected_credit_usd: 0.0,
                locked_usd: 0.0,
                created_at: now,
                updated_at: now,
            };
            Box::pin(async move { Ok(vec![wallet]) })
        });
        // Ledger says 100.00, stored balance says 150.00.
        mocks
            .wallet_repo
            .expect_sum_ledger_cents()
            .with(eq(wallet_id))
            .returning(|_| Box::pin(async { Ok(10_000) }));

        // No credit or other repair expectation exists even with autofix on.
        let usecase = mocks.build();
        let report = usecase.run(true, 7).await.unwrap();

        let check = report
            .checks
            .iter()
            .find(|c| c.check == "wallet_drift")
            .unwrap();
        assert_eq!(check.issues_found, 1);
        assert_eq!(check.issues_fixed, 0);
    }

    #[tokio::test]
    async fn dlq_backlog_over_threshold_is_flagged() {
        let mut mocks = Mocks::healthy();
        mocks.dlq_repo = MockDlqRepository::new();
        mocks
            .dlq_repo
            .expect_count_by_status()
            .with(eq(DlqStatus::Pending))
            .returning(|_| Box::pin(async { Ok(75) }));
        mocks
            .dlq_repo
            .expect_count_by_status()
            .with(eq(DlqStatus::Failed))
            .returning(|_| Box::pin(async { Ok(0) }));

        let usecase = mocks.build();
        let report = usecase.run(false, 7).await.unwrap();

        let check = report
            .checks
            .iter()
            .find(|c| c.check == "dlq_backlog")
            .unwrap();
        assert_eq!(check.issues_found, 1);
    }

    #[tokio::test]
    async fn failing_check_makes_the_report_critical_and_alerts() {
        let mut mocks = Mocks::healthy();
        mocks.wallet_repo = MockWalletRepository::new();
        mocks
            .wallet_repo
            .expect_list_wallets()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("db unavailable")) }));
        mocks
            .alerts
            .expect_send()
            .withf(|alert| alert.severity == AlertSeverity::Critical)
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = mocks.build();
        let report = usecase.run(false, 7).await.unwrap();

        assert_eq!(report.overall_status, OverallStatus::Critical);
        let check = report
            .checks
            .iter()
            .find(|c| c.check == "wallet_drift")
            .unwrap();
        assert_eq!(check.status, CheckStatus::Error);
    }

    #[tokio::test]
    async fn commission_audit_flags_missing_and_deviating_fees() {
        let mut mocks = Mocks::healthy();
        mocks.intent_repo = MockPaymentIntentRepository::new();
        mocks
            .intent_repo
            .expect_list_pending_older_than()
            .returning(|_, _, _| Box::pin(async { Ok(vec![]) }));
        mocks
            .intent_repo
            .expect_list_completed_since()
            .returning(|_, _| {
                let base = completed_intent(100.0, None);
                let missing_fee = base.clone();
                let mut wrong_fee = base.clone();
                wrong_fee.id = Uuid::new_v4();
                wrong_fee.commission_fee_usd = Some(10.0);
                let mut correct_fee = base.clone();
                correct_fee.id = Uuid::new_v4();
                correct_fee.commission_fee_usd = Some(15.0);
                // Below the auditable floor the rate deviation is exempt...
                let mut tiny_deviating = base.clone();
                tiny_deviating.id = Uuid::new_v4();
                tiny_deviating.amount_usd = 5.0;
                tiny_deviating.commission_fee_usd = Some(2.0);
                // ...but a missing fee is flagged at any amount.
                let mut tiny_missing = base;
                tiny_missing.id = Uuid::new_v4();
                tiny_missing.amount_usd = 5.0;
                Box::pin(async move {
                    Ok(vec![
                        missing_fee,
                        wrong_fee,
                        correct_fee,
                        tiny_deviating,
                        tiny_missing,
                    ])
                })
            });

        let usecase = mocks.build();
        let report = usecase.run(false, 7).await.unwrap();

        let check = report
            .checks
            .iter()
            .find(|c| c.check == "commission_audit")
            .unwrap();
        assert_eq!(check.issues_found, 3);
    }

    #[tokio::test]
    async fn completed_intent_cancelled_at_provider_is_marked_failed() {
        let intent_id = Uuid::new_v4();
        let mut mocks = Mocks::healthy();

        mocks.intent_repo = MockPaymentIntentRepository::new();
        mocks
            .intent_repo
            .expect_list_pending_older_than()
            .returning(|_, _, _| Box::pin(async { Ok(vec![]) }));
        mocks
            .intent_repo
            .expect_list_completed_since()
            .returning(move |_, _| {
                let mut intent = completed_intent(100.0, Some(15.0));
                intent.id = intent_id;
                intent.provider_payment_id = Some("mp-9".to_string());
                Box::pin(async move { Ok(vec![intent]) })
            });
        mocks
            .provider
            .expect_get_payment()
            .with(eq("mp-9"))
            .returning(|_| {
                Box::pin(async {
                    Ok(ProviderPayment {
                        id: "mp-9".to_string(),
                        status: "cancelled".to_string(),
                        status_detail: None,
                        external_reference: None,
                        transaction_amount: Some(100_000.0),
                        date_approved: None,
                    })
                })
            });
        mocks
            .intent_repo
            .expect_mark_failed()
            .with(eq(intent_id), eq("cancelled".to_string()))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let usecase = mocks.build();
        let report = usecase.run(true, 7).await.unwrap();

        let check = report
            .checks
            .iter()
            .find(|c| c.check == "downgraded_payments")
            .unwrap();
        assert_eq!(check.issues_found, 1);
        assert_eq!(check.issues_fixed, 1);
    }
}
