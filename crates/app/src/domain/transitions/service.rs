//! Transitions service: the only writer of token and request status.
//!
//! Every operation runs in exactly one database transaction. Status changes are guarded by
//! [`CompareAndSwapStatus`]; a guard that matches no row aborts the whole unit of work, which
//! rolls back when the transaction is dropped.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use custody::{
    audit::AuditAction,
    ids::{TokenId, UserId},
    items::{RequestItem, RequestLimits, dedupe_items, normalize_comment},
    status::TokenStatus,
    transition::Transition,
};
use mockall::automock;
use serde_json::json;
use tracing::{Span, error, field, info, warn};

use crate::{
    database::{CompareAndSwapStatus, Db},
    domain::{
        audit::repository::PgAuditRepository,
        requests::{
            data::NewRequest,
            records::{RequestId, RequestItemRecord, RequestRecord},
            repository::PgRequestsRepository,
        },
        tokens::repository::PgTokensRepository,
        transitions::errors::TransitionsServiceError,
        waitlist::{
            notifier::WaitlistNotifier, records::WaitlistEntry, repository::PgWaitlistRepository,
        },
    },
};

#[derive(Clone)]
pub struct PgTransitionsService {
    db: Db,
    limits: RequestLimits,
    requests: PgRequestsRepository,
    tokens: PgTokensRepository,
    audit: PgAuditRepository,
    waitlist: PgWaitlistRepository,
    notifier: Arc<dyn WaitlistNotifier>,
}

impl Debug for PgTransitionsService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgTransitionsService")
            .field("db", &self.db)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl PgTransitionsService {
    #[must_use]
    pub fn new(db: Db, limits: RequestLimits, notifier: Arc<dyn WaitlistNotifier>) -> Self {
        Self {
            db,
            limits,
            requests: PgRequestsRepository::new(),
            tokens: PgTokensRepository::new(),
            audit: PgAuditRepository::new(),
            waitlist: PgWaitlistRepository::new(),
            notifier,
        }
    }

    /// Apply one cooperative transition and return the updated request.
    ///
    /// Waiters on the request's tokens are notified once a releasing transition has committed.
    async fn advance(
        &self,
        id: RequestId,
        actor: UserId,
        transition: Transition,
    ) -> Result<RequestRecord, TransitionsServiceError> {
        let mut tx = self.db.begin().await?;

        let request = self
            .requests
            .find_request(&mut tx, id)
            .await?
            .ok_or(TransitionsServiceError::NotFound)?;

        let next = transition.apply(request.status)?;

        let swapped = self
            .requests
            .compare_and_swap_status(&mut tx, &id, request.status, next)
            .await?;

        if !swapped {
            warn!(from = %request.status, to = %next, "request changed concurrently");

            return Err(TransitionsServiceError::RaceLost);
        }

        // Items come back in byte order of token id, the order `dedupe_items` reserves them in,
        // so token rows are always locked in one order.
        let items = self.requests.get_items(&mut tx, id).await?;

        for item in &items {
            let moved = self
                .tokens
                .compare_and_swap_status(
                    &mut tx,
                    &item.token_id,
                    transition.token_from(),
                    transition.token_to(),
                )
                .await?;

            if !moved {
                error!(
                    token_id = %item.token_id,
                    expected = %transition.token_from(),
                    "token status does not match request status"
                );

                return Err(TransitionsServiceError::TokenStatusMismatch(
                    item.token_id.clone(),
                ));
            }
        }

        let updated = self
            .requests
            .stamp_transition(&mut tx, id, next, actor)
            .await?;

        let payload = json!({
            "from": request.status.as_str(),
            "to": next.as_str(),
            "items": item_payload(&items),
        });

        self.audit
            .append(&mut tx, Some(id), actor, transition.audit_action(), &payload)
            .await?;

        tx.commit().await?;

        info!(status = %next, item_count = items.len(), "request transition committed");

        if transition.releases_tokens() {
            let tokens: Vec<TokenId> = items.into_iter().map(|item| item.token_id).collect();

            self.drain_waitlist(&tokens).await;
        }

        Ok(updated)
    }

    /// Hand every waiter on the freed tokens to the notifier.
    ///
    /// Runs after the releasing transaction committed; nothing here can undo that commit.
    async fn drain_waitlist(&self, tokens: &[TokenId]) {
        let entries = match self.pop_waiters(tokens).await {
            Ok(entries) => entries,
            Err(err) => {
                error!(error = %err, "failed to drain waitlist");
                return;
            }
        };

        for entry in &entries {
            if let Err(err) = self.notifier.notify(entry).await {
                warn!(
                    error = %err,
                    requester_id = %entry.requester_id,
                    token_id = %entry.token_id,
                    "waitlist notification failed"
                );
            }
        }
    }

    async fn pop_waiters(&self, tokens: &[TokenId]) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let entries = self.waitlist.pop_available(&mut tx, tokens).await?;

        tx.commit().await?;

        Ok(entries)
    }
}

fn item_payload(items: &[RequestItemRecord]) -> Vec<RequestItem> {
    items
        .iter()
        .map(|item| RequestItem::new(item.company.clone(), item.token_id.clone()))
        .collect()
}

#[async_trait]
impl TransitionsService for PgTransitionsService {
    #[tracing::instrument(
        name = "transitions.service.create_request",
        skip_all,
        fields(requester_id = %request.requester_id, request_id = field::Empty),
        err
    )]
    async fn create_request(
        &self,
        request: NewRequest,
    ) -> Result<RequestId, TransitionsServiceError> {
        let items = dedupe_items(request.items.iter().cloned());
        let comment = normalize_comment(request.comment.clone());

        self.limits
            .validate(&items, &request.purpose, comment.as_deref())?;

        let request = NewRequest {
            purpose: request.purpose.trim().to_string(),
            comment,
            items,
            ..request
        };

        let mut tx = self.db.begin().await?;

        // Advisory: the reservation below is the authoritative check.
        for item in &request.items {
            match self.tokens.find_token(&mut tx, &item.token_id).await? {
                None => {
                    return Err(TransitionsServiceError::TokenNotFound(
                        item.token_id.clone(),
                    ));
                }
                Some(token) if token.status != TokenStatus::Available => {
                    return Err(TransitionsServiceError::TokenNotAvailable(
                        item.token_id.clone(),
                    ));
                }
                Some(_) => {}
            }
        }

        let record = self
            .requests
            .create_request(&mut tx, &request)
            .await?;

        for item in &request.items {
            let reserved = self
                .tokens
                .compare_and_swap_status(
                    &mut tx,
                    &item.token_id,
                    TokenStatus::Available,
                    TokenStatus::Reserved,
                )
                .await?;

            if !reserved {
                warn!(token_id = %item.token_id, "token reserved by a concurrent request");

                return Err(TransitionsServiceError::TokenReserveFailed(
                    item.token_id.clone(),
                ));
            }
        }

        let payload = json!({
            "items": &request.items,
            "purpose": &request.purpose,
            "comment": &request.comment,
        });

        self.audit
            .append(
                &mut tx,
                Some(record.id),
                request.requester_id,
                AuditAction::Requested,
                &payload,
            )
            .await?;

        tx.commit().await?;

        Span::current().record("request_id", record.id.get());

        info!(item_count = request.items.len(), "request created");

        Ok(record.id)
    }

    #[tracing::instrument(
        name = "transitions.service.decide",
        skip(self),
        fields(request_id = %id, actor_id = %actor),
        err
    )]
    async fn decide(
        &self,
        id: RequestId,
        actor: UserId,
        approve: bool,
    ) -> Result<RequestRecord, TransitionsServiceError> {
        self.advance(id, actor, Transition::decision(approve)).await
    }

    #[tracing::instrument(
        name = "transitions.service.issue",
        skip(self),
        fields(request_id = %id, actor_id = %actor),
        err
    )]
    async fn issue(
        &self,
        id: RequestId,
        actor: UserId,
    ) -> Result<RequestRecord, TransitionsServiceError> {
        self.advance(id, actor, Transition::Issue).await
    }

    #[tracing::instrument(
        name = "transitions.service.return_request",
        skip(self),
        fields(request_id = %id, actor_id = %actor),
        err
    )]
    async fn return_request(
        &self,
        id: RequestId,
        actor: UserId,
    ) -> Result<RequestRecord, TransitionsServiceError> {
        self.advance(id, actor, Transition::Return).await
    }

    #[tracing::instrument(
        name = "transitions.service.admin_delete",
        skip(self),
        fields(request_id = %id, actor_id = %actor),
        err
    )]
    async fn admin_delete(
        &self,
        id: RequestId,
        actor: UserId,
    ) -> Result<bool, TransitionsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(request) = self.requests.find_request(&mut tx, id).await? else {
            return Ok(false);
        };

        let items = self.requests.get_items(&mut tx, id).await?;

        for item in &items {
            self.tokens
                .force_status(&mut tx, &item.token_id, TokenStatus::Available)
                .await?;
        }

        // Recorded without a request reference so it survives the deletion below.
        let payload = json!({
            "request_id": id.get(),
            "status": request.status.as_str(),
            "requester_id": request.requester_id.get(),
            "items": item_payload(&items),
        });

        self.audit
            .append(&mut tx, None, actor, AuditAction::AdminDeleted, &payload)
            .await?;

        let ids = [id];

        self.audit.delete_for_requests(&mut tx, &ids).await?;
        self.requests.delete_items(&mut tx, &ids).await?;
        self.requests.delete_requests(&mut tx, &ids).await?;

        tx.commit().await?;

        info!(
            status = %request.status,
            released = items.len(),
            "request deleted by administrator"
        );

        Ok(true)
    }

    #[tracing::instrument(name = "transitions.service.purge_older_than", skip(self), err)]
    async fn purge_older_than(&self, days: u32) -> Result<u64, TransitionsServiceError> {
        let days = i32::try_from(days)?;

        let mut tx = self.db.begin().await?;

        let ids = self.requests.list_purgeable(&mut tx, days).await?;

        if ids.is_empty() {
            tx.commit().await?;

            return Ok(0);
        }

        self.audit.delete_for_requests(&mut tx, &ids).await?;
        self.requests.delete_items(&mut tx, &ids).await?;

        let removed = self.requests.delete_requests(&mut tx, &ids).await?;

        tx.commit().await?;

        info!(removed, "purged terminal requests");

        Ok(removed)
    }
}

#[automock]
#[async_trait]
pub trait TransitionsService: Send + Sync {
    /// Create a request and reserve all of its tokens, or none of them.
    async fn create_request(&self, request: NewRequest)
    -> Result<RequestId, TransitionsServiceError>;

    /// Approve or reject a request awaiting a decision. A rejection notifies anyone waiting on
    /// the released tokens.
    async fn decide(
        &self,
        id: RequestId,
        actor: UserId,
        approve: bool,
    ) -> Result<RequestRecord, TransitionsServiceError>;

    /// Hand the tokens of an approved request over to the requester.
    async fn issue(
        &self,
        id: RequestId,
        actor: UserId,
    ) -> Result<RequestRecord, TransitionsServiceError>;

    /// Take the tokens of an issued request back and notify anyone waiting on them.
    async fn return_request(
        &self,
        id: RequestId,
        actor: UserId,
    ) -> Result<RequestRecord, TransitionsServiceError>;

    /// Release every token of a request regardless of status and erase the request.
    ///
    /// Returns `false` when the request does not exist.
    async fn admin_delete(&self, id: RequestId, actor: UserId)
    -> Result<bool, TransitionsServiceError>;

    /// Delete rejected and returned requests submitted at least `days` days ago.
    async fn purge_older_than(&self, days: u32) -> Result<u64, TransitionsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use custody::{items::ValidationError, status::RequestStatus};
    use sqlx::query;
    use testresult::TestResult;

    use crate::{
        domain::{
            audit::AuditService,
            requests::{LedgerService, LedgerServiceError},
            tokens::TokensService,
            waitlist::{notifier::MockWaitlistNotifier, NotifyError, WaitlistService},
        },
        test::{
            TestContext,
            helpers::{ADMIN, APPROVER, CUSTODIAN, REQUESTER, new_request},
        },
    };

    use super::*;

    async fn issued_request(ctx: &TestContext, tokens: &[&str]) -> TestResult<RequestId> {
        let request = ctx.create_request(tokens).await?;

        ctx.transitions.decide(request.id, APPROVER, true).await?;
        ctx.transitions.issue(request.id, CUSTODIAN).await?;

        Ok(request.id)
    }

    #[tokio::test]
    async fn create_request_reserves_every_token() -> TestResult {
        let ctx = TestContext::new().await;

        let id = ctx
            .transitions
            .create_request(new_request(&["KEY-02", "KEY-01"]))
            .await?;

        let request = ctx.ledger.get_request(id).await?;

        assert_eq!(request.status, RequestStatus::Requested);
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Reserved);
        assert_eq!(ctx.token_status("KEY-02").await?, TokenStatus::Reserved);
        assert_eq!(ctx.token_status("KEY-03").await?, TokenStatus::Available);

        Ok(())
    }

    #[tokio::test]
    async fn create_request_keeps_last_company_for_duplicate_token() -> TestResult {
        let ctx = TestContext::new().await;

        let mut request = new_request(&["KEY-01"]);
        request.items.push(RequestItem::new("Relabelled Co", "KEY-01"));

        let id = ctx.transitions.create_request(request).await?;
        let items = ctx.ledger.get_request_items(id).await?;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].company, "Relabelled Co");

        Ok(())
    }

    #[tokio::test]
    async fn create_request_normalises_blank_comment_and_trims_purpose() -> TestResult {
        let ctx = TestContext::new().await;

        let mut request = new_request(&["KEY-01"]);
        request.purpose = "  quarterly filing  ".to_string();
        request.comment = Some("   ".to_string());

        let id = ctx.transitions.create_request(request).await?;
        let stored = ctx.ledger.get_request(id).await?;

        assert_eq!(stored.purpose, "quarterly filing");
        assert_eq!(stored.comment, None);

        Ok(())
    }

    #[tokio::test]
    async fn create_request_unknown_token_persists_nothing() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .transitions
            .create_request(new_request(&["KEY-01", "KEY-99"]))
            .await;

        assert!(
            matches!(&result, Err(TransitionsServiceError::TokenNotFound(t)) if t.as_str() == "KEY-99"),
            "expected TokenNotFound, got {result:?}"
        );
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Available);
        assert!(ctx.ledger.list_recent(10).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn create_request_held_token_leaves_other_tokens_untouched() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.create_request(&["KEY-02"]).await?;

        let result = ctx
            .transitions
            .create_request(new_request(&["KEY-01", "KEY-02"]))
            .await;

        assert!(
            matches!(&result, Err(TransitionsServiceError::TokenNotAvailable(t)) if t.as_str() == "KEY-02"),
            "expected TokenNotAvailable, got {result:?}"
        );
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Available);
        assert_eq!(ctx.ledger.list_recent(10).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn create_request_validates_before_touching_storage() -> TestResult {
        let ctx = TestContext::new().await;

        let empty = ctx.transitions.create_request(new_request(&[])).await;

        assert!(
            matches!(
                empty,
                Err(TransitionsServiceError::Validation(ValidationError::NoItems))
            ),
            "expected NoItems, got {empty:?}"
        );

        let too_many = ctx
            .transitions
            .create_request(new_request(&[
                "KEY-11", "KEY-12", "KEY-13", "KEY-14", "KEY-15", "KEY-16",
            ]))
            .await;

        assert!(
            matches!(
                too_many,
                Err(TransitionsServiceError::Validation(
                    ValidationError::TooManyItems { max: 5, actual: 6 }
                ))
            ),
            "expected TooManyItems, got {too_many:?}"
        );

        let mut blank = new_request(&["KEY-01"]);
        blank.purpose = "   ".to_string();

        let blank = ctx.transitions.create_request(blank).await;

        assert!(
            matches!(
                blank,
                Err(TransitionsServiceError::Validation(
                    ValidationError::EmptyPurpose
                ))
            ),
            "expected EmptyPurpose, got {blank:?}"
        );

        let mut chatty = new_request(&["KEY-01"]);
        chatty.comment = Some("x".repeat(301));

        let chatty = ctx.transitions.create_request(chatty).await;

        assert!(
            matches!(
                chatty,
                Err(TransitionsServiceError::Validation(
                    ValidationError::CommentTooLong { max: 300, .. }
                ))
            ),
            "expected CommentTooLong, got {chatty:?}"
        );

        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Available);

        Ok(())
    }

    #[tokio::test]
    async fn overlapping_concurrent_creations_reserve_all_or_nothing() -> TestResult {
        let ctx = TestContext::new().await;

        let (left, right) = tokio::join!(
            ctx.transitions
                .create_request(new_request(&["KEY-01", "KEY-02"])),
            ctx.transitions
                .create_request(new_request(&["KEY-02", "KEY-03"])),
        );

        assert!(
            left.is_ok() != right.is_ok(),
            "exactly one creation must win: {left:?} / {right:?}"
        );

        let (loser, loser_only) = if left.is_ok() {
            (right, "KEY-03")
        } else {
            (left, "KEY-01")
        };

        assert!(
            matches!(
                loser,
                Err(TransitionsServiceError::TokenNotAvailable(_)
                    | TransitionsServiceError::TokenReserveFailed(_))
            ),
            "loser must fail on the shared token, got {loser:?}"
        );
        assert_eq!(ctx.token_status("KEY-02").await?, TokenStatus::Reserved);
        assert_eq!(ctx.token_status(loser_only).await?, TokenStatus::Available);
        assert_eq!(ctx.ledger.list_recent(10).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn full_lifecycle_releases_tokens_and_audits_each_step() -> TestResult {
        let ctx = TestContext::new().await;

        let id = ctx.create_request(&["KEY-01", "KEY-02"]).await?.id;

        let approved = ctx.transitions.decide(id, APPROVER, true).await?;
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(approved.approved_by, Some(APPROVER));
        assert!(approved.approved_at.is_some());
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Reserved);

        let issued = ctx.transitions.issue(id, CUSTODIAN).await?;
        assert_eq!(issued.status, RequestStatus::Issued);
        assert_eq!(issued.issued_by, Some(CUSTODIAN));
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Issued);

        let returned = ctx.transitions.return_request(id, CUSTODIAN).await?;
        assert_eq!(returned.status, RequestStatus::Returned);
        assert_eq!(returned.returned_by, Some(CUSTODIAN));
        assert!(returned.returned_at.is_some());

        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Available);
        assert_eq!(ctx.token_status("KEY-02").await?, TokenStatus::Available);

        let trail = ctx.audit.query(Some(id), 10).await?;
        let actions: Vec<AuditAction> = trail.iter().rev().map(|e| e.action).collect();

        assert_eq!(
            actions,
            [
                AuditAction::Requested,
                AuditAction::Approved,
                AuditAction::Issued,
                AuditAction::Returned,
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn second_decision_fails() -> TestResult {
        let ctx = TestContext::new().await;

        let id = ctx.create_request(&["KEY-01"]).await?.id;

        ctx.transitions.decide(id, APPROVER, true).await?;

        let again = ctx.transitions.decide(id, APPROVER, true).await;

        assert!(
            matches!(
                again,
                Err(TransitionsServiceError::InvalidState {
                    status: RequestStatus::Approved
                } | TransitionsServiceError::RaceLost)
            ),
            "expected InvalidState or RaceLost, got {again:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn simultaneous_decisions_have_exactly_one_winner() -> TestResult {
        let ctx = TestContext::new().await;

        let id = ctx.create_request(&["KEY-01"]).await?.id;

        let (approve, reject) = tokio::join!(
            ctx.transitions.decide(id, APPROVER, true),
            ctx.transitions.decide(id, APPROVER, false),
        );

        assert!(
            approve.is_ok() != reject.is_ok(),
            "exactly one decision must win: {approve:?} / {reject:?}"
        );

        let loser = if approve.is_ok() { reject } else { approve };

        assert!(
            matches!(
                loser,
                Err(TransitionsServiceError::RaceLost
                    | TransitionsServiceError::InvalidState { .. })
            ),
            "loser must observe the race, got {loser:?}"
        );

        let trail = ctx.audit.query(Some(id), 10).await?;

        assert_eq!(trail.len(), 2, "only the winning decision is audited");

        Ok(())
    }

    #[tokio::test]
    async fn decision_blocked_by_concurrent_writer_loses_race() -> TestResult {
        let ctx = TestContext::new().await;

        let id = ctx.create_request(&["KEY-01"]).await?.id;

        // Hold the request row in an uncommitted competing decision.
        let mut competitor = ctx.db.pool().begin().await?;

        query("UPDATE requests SET status = 'APPROVED' WHERE id = $1")
            .bind(id.get())
            .execute(&mut *competitor)
            .await?;

        let transitions = ctx.transitions.clone();
        let pending =
            tokio::spawn(async move { transitions.decide(id, APPROVER, false).await });

        tokio::time::sleep(Duration::from_millis(250)).await;

        competitor.commit().await?;

        let result = pending.await?;

        assert!(
            matches!(result, Err(TransitionsServiceError::RaceLost)),
            "expected RaceLost, got {result:?}"
        );
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Reserved);
        assert_eq!(
            ctx.ledger.get_request(id).await?.status,
            RequestStatus::Approved
        );

        Ok(())
    }

    #[tokio::test]
    async fn rejection_frees_tokens_and_notifies_waiter_once() -> TestResult {
        let waiter = UserId::new(5005);
        let mut notifier = MockWaitlistNotifier::new();

        notifier
            .expect_notify()
            .once()
            .withf(move |entry| {
                entry.requester_id == waiter && entry.token_id.as_str() == "KEY-01"
            })
            .returning(|_| Ok(()));

        let ctx = TestContext::with_notifier(Arc::new(notifier)).await;
        let token = TokenId::new("KEY-01");

        let id = ctx.create_request(&["KEY-01"]).await?.id;

        ctx.waitlist.join(waiter, &token, "Northwind Grain").await?;

        let rejected = ctx.transitions.decide(id, APPROVER, false).await?;

        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(rejected.approved_by, Some(APPROVER));
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Available);
        assert!(ctx.waitlist.list_for_user(waiter).await?.is_empty());
        assert!(ctx.waitlist.pop_available(&[token]).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn transitions_out_of_order_are_invalid() -> TestResult {
        let ctx = TestContext::new().await;

        let id = ctx.create_request(&["KEY-01"]).await?.id;

        let issue = ctx.transitions.issue(id, CUSTODIAN).await;

        assert!(
            matches!(
                issue,
                Err(TransitionsServiceError::InvalidState {
                    status: RequestStatus::Requested
                })
            ),
            "expected InvalidState, got {issue:?}"
        );

        ctx.transitions.decide(id, APPROVER, true).await?;

        let early_return = ctx.transitions.return_request(id, CUSTODIAN).await;

        assert!(
            matches!(
                early_return,
                Err(TransitionsServiceError::InvalidState {
                    status: RequestStatus::Approved
                })
            ),
            "expected InvalidState, got {early_return:?}"
        );
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Reserved);

        Ok(())
    }

    #[tokio::test]
    async fn transitions_on_missing_request_return_not_found() {
        let ctx = TestContext::new().await;
        let missing = RequestId::from_i64(404);

        let decide = ctx.transitions.decide(missing, APPROVER, true).await;
        let issue = ctx.transitions.issue(missing, CUSTODIAN).await;
        let ret = ctx.transitions.return_request(missing, CUSTODIAN).await;

        assert!(matches!(decide, Err(TransitionsServiceError::NotFound)));
        assert!(matches!(issue, Err(TransitionsServiceError::NotFound)));
        assert!(matches!(ret, Err(TransitionsServiceError::NotFound)));
    }

    #[tokio::test]
    async fn tampered_token_aborts_transition_as_fatal() -> TestResult {
        let ctx = TestContext::new().await;

        let id = ctx.create_request(&["KEY-01", "KEY-02"]).await?.id;

        ctx.transitions.decide(id, APPROVER, true).await?;

        query("UPDATE tokens SET status = 'available' WHERE token_id = 'KEY-02'")
            .execute(ctx.db.pool())
            .await?;

        let result = ctx.transitions.issue(id, CUSTODIAN).await;

        let Err(error) = result else {
            panic!("expected TokenStatusMismatch, got {result:?}");
        };

        assert!(error.is_fatal());
        assert!(
            matches!(&error, TransitionsServiceError::TokenStatusMismatch(t) if t.as_str() == "KEY-02")
        );

        // The whole unit of work rolled back, including KEY-01.
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Reserved);
        assert_eq!(
            ctx.ledger.get_request(id).await?.status,
            RequestStatus::Approved
        );
        assert_eq!(ctx.audit.query(Some(id), 10).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn return_notifies_every_waiter_on_freed_tokens() -> TestResult {
        let mut notifier = MockWaitlistNotifier::new();

        notifier
            .expect_notify()
            .times(2)
            .withf(|entry| entry.token_id.as_str() == "KEY-01")
            .returning(|_| Ok(()));

        let ctx = TestContext::with_notifier(Arc::new(notifier)).await;
        let token = TokenId::new("KEY-01");

        let id = issued_request(&ctx, &["KEY-01"]).await?;

        ctx.waitlist
            .join(UserId::new(5005), &token, "Northwind Grain")
            .await?;
        ctx.waitlist
            .join(UserId::new(5006), &token, "Northwind Grain")
            .await?;
        ctx.waitlist
            .join(UserId::new(5005), &TokenId::new("KEY-03"), "Prairie Mills")
            .await?;

        ctx.transitions.return_request(id, CUSTODIAN).await?;

        assert!(ctx.waitlist.pop_available(&[token]).await?.is_empty());
        assert_eq!(
            ctx.waitlist.list_for_user(UserId::new(5005)).await?.len(),
            1,
            "waiters on other tokens stay queued"
        );

        Ok(())
    }

    #[tokio::test]
    async fn failed_notification_does_not_undo_return() -> TestResult {
        let mut notifier = MockWaitlistNotifier::new();

        notifier
            .expect_notify()
            .once()
            .returning(|_| Err(NotifyError::Delivery("chat unreachable".to_string())));

        let ctx = TestContext::with_notifier(Arc::new(notifier)).await;
        let token = TokenId::new("KEY-01");

        let id = issued_request(&ctx, &["KEY-01"]).await?;

        ctx.waitlist
            .join(UserId::new(5005), &token, "Northwind Grain")
            .await?;

        let returned = ctx.transitions.return_request(id, CUSTODIAN).await?;

        assert_eq!(returned.status, RequestStatus::Returned);
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Available);
        assert!(ctx.waitlist.list_for_user(UserId::new(5005)).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn approval_and_admin_delete_never_notify_waiters() -> TestResult {
        let mut notifier = MockWaitlistNotifier::new();

        notifier.expect_notify().never();

        let ctx = TestContext::with_notifier(Arc::new(notifier)).await;
        let token = TokenId::new("KEY-01");

        let id = ctx.create_request(&["KEY-01"]).await?.id;

        ctx.waitlist
            .join(UserId::new(5005), &token, "Northwind Grain")
            .await?;

        ctx.transitions.decide(id, APPROVER, true).await?;
        ctx.transitions.admin_delete(id, ADMIN).await?;

        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Available);
        assert_eq!(ctx.waitlist.list_for_user(UserId::new(5005)).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn admin_delete_issued_request_restores_token() -> TestResult {
        let ctx = TestContext::new().await;

        let id = issued_request(&ctx, &["KEY-01"]).await?;

        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Issued);

        let deleted = ctx.transitions.admin_delete(id, ADMIN).await?;

        assert!(deleted);
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Available);

        let lookup = ctx.ledger.get_request(id).await;

        assert!(
            matches!(lookup, Err(LedgerServiceError::NotFound)),
            "expected NotFound, got {lookup:?}"
        );

        assert!(ctx.audit.query(Some(id), 10).await?.is_empty());

        let trail = ctx.audit.query(None, 10).await?;

        assert_eq!(trail.len(), 1, "only the deletion itself remains");
        assert_eq!(trail[0].action, AuditAction::AdminDeleted);
        assert_eq!(trail[0].actor_id, ADMIN);
        assert_eq!(trail[0].request_id, None);
        assert_eq!(trail[0].payload["request_id"], id.get());
        assert_eq!(trail[0].payload["status"], "ISSUED");

        Ok(())
    }

    #[tokio::test]
    async fn admin_delete_missing_request_returns_false() -> TestResult {
        let ctx = TestContext::new().await;

        let deleted = ctx
            .transitions
            .admin_delete(RequestId::from_i64(404), ADMIN)
            .await?;

        assert!(!deleted);
        assert!(ctx.audit.query(None, 10).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn admin_delete_releases_token_for_new_request() -> TestResult {
        let ctx = TestContext::new().await;

        let id = ctx.create_request(&["KEY-01"]).await?.id;

        ctx.transitions.admin_delete(id, ADMIN).await?;

        let again = ctx.create_request(&["KEY-01"]).await?;

        assert_eq!(again.status, RequestStatus::Requested);

        Ok(())
    }

    #[tokio::test]
    async fn purge_removes_returned_request_with_items_and_audit() -> TestResult {
        let ctx = TestContext::new().await;

        let id = issued_request(&ctx, &["KEY-01", "KEY-02"]).await?;

        ctx.transitions.return_request(id, CUSTODIAN).await?;

        let removed = ctx.transitions.purge_older_than(0).await?;

        assert_eq!(removed, 1);
        assert!(matches!(
            ctx.ledger.get_request(id).await,
            Err(LedgerServiceError::NotFound)
        ));
        assert!(ctx.audit.query(Some(id), 10).await?.is_empty());

        let orphans = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM request_items")
            .fetch_one(ctx.db.pool())
            .await?;

        assert_eq!(orphans, 0);
        assert_eq!(ctx.token_status("KEY-01").await?, TokenStatus::Available);

        Ok(())
    }

    #[tokio::test]
    async fn purge_never_touches_open_requests() -> TestResult {
        let ctx = TestContext::new().await;

        let requested = ctx.create_request(&["KEY-01"]).await?.id;

        let approved = ctx.create_request(&["KEY-02"]).await?.id;
        ctx.transitions.decide(approved, APPROVER, true).await?;

        let issued = issued_request(&ctx, &["KEY-03"]).await?;

        query("UPDATE requests SET requested_at = now() - interval '400 days'")
            .execute(ctx.db.pool())
            .await?;

        let removed = ctx.transitions.purge_older_than(30).await?;

        assert_eq!(removed, 0);

        for id in [requested, approved, issued] {
            assert!(ctx.ledger.get_request(id).await.is_ok());
        }

        assert_eq!(ctx.token_status("KEY-03").await?, TokenStatus::Issued);

        Ok(())
    }

    #[tokio::test]
    async fn purge_respects_age_threshold() -> TestResult {
        let ctx = TestContext::new().await;

        let old = ctx.create_request(&["KEY-01"]).await?.id;
        ctx.transitions.decide(old, APPROVER, false).await?;

        let recent = ctx.create_request(&["KEY-02"]).await?.id;
        ctx.transitions.decide(recent, APPROVER, false).await?;

        query("UPDATE requests SET requested_at = now() - interval '40 days' WHERE id = $1")
            .bind(old.get())
            .execute(ctx.db.pool())
            .await?;

        let removed = ctx.transitions.purge_older_than(30).await?;

        assert_eq!(removed, 1);
        assert!(ctx.ledger.get_request(old).await.is_err());
        assert!(ctx.ledger.get_request(recent).await.is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn purge_rejects_out_of_range_period() {
        let ctx = TestContext::new().await;

        let result = ctx.transitions.purge_older_than(u32::MAX).await;

        assert!(
            matches!(result, Err(TransitionsServiceError::InvalidRetention(_))),
            "expected InvalidRetention, got {result:?}"
        );
    }

    #[tokio::test]
    async fn held_tokens_belong_to_exactly_one_open_request() -> TestResult {
        let ctx = TestContext::new().await;

        let first = ctx.create_request(&["KEY-01", "KEY-02"]).await?.id;
        ctx.transitions.decide(first, APPROVER, true).await?;

        let second = ctx.create_request(&["KEY-03"]).await?.id;
        ctx.transitions.decide(second, APPROVER, false).await?;

        ctx.create_request(&["KEY-03"]).await?;

        let holders = sqlx::query_as::<_, (String, i64)>(
            "SELECT i.token_id, COUNT(*) \
             FROM request_items i \
             JOIN requests r ON r.id = i.request_id \
             WHERE r.status IN ('REQUESTED', 'APPROVED', 'ISSUED') \
             GROUP BY i.token_id",
        )
        .fetch_all(ctx.db.pool())
        .await?;

        assert!(holders.iter().all(|(_, count)| *count == 1));

        for token in ctx.tokens.list_tokens().await? {
            let held = holders
                .iter()
                .any(|(id, _)| id.as_str() == token.token_id.as_str());

            assert_eq!(token.status.is_held(), held, "token {}", token.token_id);
        }

        Ok(())
    }
}
