use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{ActorContext, Permission, Visibility};
use crate::orders::{OrderService, OrderStatus};
use crate::payments::error::PaymentError;
use crate::payments::gateway::{map_provider_status, PaymentGateway};
use crate::payments::models::{
    CreatePaymentRequest, CreatePaymentResponse, GetPaymentsQuery, NewPayment, OrderPaymentSummary,
    Payment, PaymentMethod, PaymentProvider, PaymentStatus, PaymentSummaryRow,
    RefundPaymentRequest,
};
use crate::payments::repository::{covers_total, resolve_refund_amount, PaymentsRepository};
use crate::payments::status_machine::PaymentStatusMachine;
use crate::shifts::ShiftService;

/// Service for the payment settlement engine
#[derive(Clone)]
pub struct PaymentService {
    repository: PaymentsRepository,
    order_service: OrderService,
    shift_service: ShiftService,
    gateway: Option<PaymentGateway>,
}

impl PaymentService {
    pub fn new(
        repository: PaymentsRepository,
        order_service: OrderService,
        shift_service: ShiftService,
        gateway: Option<PaymentGateway>,
    ) -> Self {
        Self {
            repository,
            order_service,
            shift_service,
            gateway,
        }
    }

    /// Take a payment against a PENDING order.
    ///
    /// Cash settles immediately against the cashier's open shift. Card and
    /// wallet payments go through the gateway and stay INITIATED until the
    /// webhook confirms the charge.
    pub async fn create_payment(
        &self,
        request: CreatePaymentRequest,
        actor: &ActorContext,
    ) -> Result<CreatePaymentResponse, PaymentError> {
        let order = self
            .order_service
            .get_order(request.order_id, actor)
            .await?
            .order;

        if order.status != OrderStatus::Pending {
            return Err(PaymentError::InvalidState(
                "Payments can only be taken against PENDING orders".to_string(),
            ));
        }

        // Reversal orders carry negative totals; their settlements are
        // recorded as negative amounts so shift cash sums net correctly.
        // The amount itself is resolved by the repository under the order
        // row lock, so concurrent payments cannot both claim the balance.
        let is_reversal = order.total_amount < Decimal::ZERO;

        if !request.method.requires_gateway() {
            let shift_id = self.shift_service.validate_cash_shift(actor).await?;

            let payment = self
                .repository
                .create_guarded(
                    NewPayment {
                        order_id: order.id,
                        company_id: order.company_id,
                        store_id: order.store_id,
                        shift_id: Some(shift_id),
                        processed_by: actor.user_id,
                        currency: "BHD".to_string(),
                        method: PaymentMethod::Cash,
                        provider: PaymentProvider::Internal,
                        status: PaymentStatus::Success,
                        customer_ref: request.customer_ref,
                        notes: request.notes,
                    },
                    request.amount,
                )
                .await?;

            self.try_settle(order.id).await?;

            tracing::info!(
                "Cash payment {} of {} taken for order {}",
                payment.id,
                payment.amount,
                order.order_number
            );

            Ok(CreatePaymentResponse {
                payment,
                requires_action: false,
                payment_url: None,
            })
        } else {
            if is_reversal {
                return Err(PaymentError::InvalidState(
                    "Reversal orders settle in cash or by refunding the original payment"
                        .to_string(),
                ));
            }

            let gateway = self.gateway.as_ref().ok_or_else(|| {
                PaymentError::Gateway("Payment gateway is not configured".to_string())
            })?;

            let shift_id = self.shift_service.open_shift_id(actor).await?;

            let payment = self
                .repository
                .create_guarded(
                    NewPayment {
                        order_id: order.id,
                        company_id: order.company_id,
                        store_id: order.store_id,
                        shift_id,
                        processed_by: actor.user_id,
                        currency: "BHD".to_string(),
                        method: request.method,
                        provider: PaymentProvider::Gateway,
                        status: PaymentStatus::Initiated,
                        customer_ref: request.customer_ref,
                        notes: request.notes,
                    },
                    request.amount,
                )
                .await?;

            let outcome = match gateway
                .create_charge(
                    payment.id,
                    order.id,
                    payment.amount.abs(),
                    order.customer_name.as_deref(),
                    order.customer_phone.as_deref(),
                )
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    // Keep the failed attempt on record before bubbling up.
                    self.repository
                        .transition_status(
                            payment.id,
                            PaymentStatus::Initiated,
                            PaymentStatus::Failed,
                            Some(&err.to_string()),
                            None,
                        )
                        .await?;
                    return Err(err);
                }
            };

            let payment = self
                .repository
                .set_provider_ref(payment.id, &outcome.charge_id, &outcome.raw)
                .await?;

            let payment = match map_provider_status(&outcome.status) {
                PaymentStatus::Success => {
                    // Some charges capture synchronously.
                    self.apply_success(payment, Some(&outcome.raw)).await?
                }
                PaymentStatus::Failed => self
                    .repository
                    .transition_status(
                        payment.id,
                        PaymentStatus::Initiated,
                        PaymentStatus::Failed,
                        Some("Charge declined by provider"),
                        Some(&outcome.raw),
                    )
                    .await?
                    .unwrap_or(payment),
                _ => payment,
            };

            let requires_action = payment.status == PaymentStatus::Initiated;
            Ok(CreatePaymentResponse {
                payment,
                requires_action,
                payment_url: outcome.payment_url,
            })
        }
    }

    /// Process a gateway webhook callback.
    ///
    /// Replays are harmless: the conditional INITIATED transition and the
    /// settlement check both no-op when the work was already done.
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), PaymentError> {
        let gateway = self.gateway.as_ref().ok_or_else(|| {
            PaymentError::Gateway("Payment gateway is not configured".to_string())
        })?;

        gateway.verify_webhook_signature(body, signature)?;

        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| PaymentError::ValidationFailed(format!("Malformed webhook body: {e}")))?;

        let charge_id = payload["id"].as_str().unwrap_or_default();
        let provider_status = payload["status"].as_str().unwrap_or_default();

        let payment = match payload["reference"]["transaction"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
        {
            Some(payment_id) => self.repository.find_by_id(payment_id).await?,
            None => self.repository.find_by_provider_ref(charge_id).await?,
        };
        let Some(payment) = payment else {
            tracing::warn!("Webhook for unknown charge {}", charge_id);
            return Err(PaymentError::NotFound);
        };

        if payment.status != PaymentStatus::Initiated {
            tracing::info!(
                "Webhook replay for payment {} (already {})",
                payment.id,
                payment.status
            );
            return Ok(());
        }

        match map_provider_status(provider_status) {
            PaymentStatus::Success => {
                self.apply_success(payment, Some(&payload)).await?;
            }
            PaymentStatus::Failed => {
                let reason = payload["response"]["message"]
                    .as_str()
                    .unwrap_or("Charge failed");
                self.repository
                    .transition_status(
                        payment.id,
                        PaymentStatus::Initiated,
                        PaymentStatus::Failed,
                        Some(reason),
                        Some(&payload),
                    )
                    .await?;
                tracing::info!("Payment {} failed: {}", payment.id, reason);
            }
            _ => {
                tracing::debug!(
                    "Payment {} still pending at provider ({})",
                    payment.id,
                    provider_status
                );
            }
        }

        Ok(())
    }

    /// Refund a successful payment, in full or for a requested partial
    /// amount. Gateway payments are refunded at the provider first; a PAID
    /// order drops back to PENDING because its settlement no longer covers
    /// the total.
    pub async fn refund(
        &self,
        payment_id: Uuid,
        request: RefundPaymentRequest,
        actor: &ActorContext,
    ) -> Result<Payment, PaymentError> {
        if !actor.can(Permission::RefundPayments) {
            return Err(PaymentError::Forbidden(
                "Refunding payments requires manager privileges".to_string(),
            ));
        }

        let payment = self.visible_payment(payment_id, actor).await?;

        PaymentStatusMachine::transition(payment.status, PaymentStatus::Refunded)
            .map_err(PaymentError::InvalidState)?;

        let refund_amount = resolve_refund_amount(payment.amount, request.amount)?;

        if payment.provider == PaymentProvider::Gateway {
            let gateway = self.gateway.as_ref().ok_or_else(|| {
                PaymentError::Gateway("Payment gateway is not configured".to_string())
            })?;
            let charge_id = payment.provider_ref.as_deref().ok_or_else(|| {
                PaymentError::Internal("Gateway payment has no provider reference".to_string())
            })?;
            gateway
                .create_refund(charge_id, refund_amount, &request.reason)
                .await?;
        }

        let refunded = self
            .repository
            .mark_refunded(payment_id, actor.user_id, refund_amount, &request.reason)
            .await?
            .ok_or_else(|| {
                PaymentError::InvalidState("Payment was already refunded".to_string())
            })?;

        if self.repository.revert_order_to_pending(payment.order_id).await? {
            tracing::info!(
                "Order {} reverted to PENDING after refund of payment {}",
                payment.order_id,
                payment_id
            );
        }

        Ok(refunded)
    }

    pub async fn get_payment(
        &self,
        payment_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Payment, PaymentError> {
        self.visible_payment(payment_id, actor).await
    }

    pub async fn order_payments(
        &self,
        order_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Vec<Payment>, PaymentError> {
        // Visibility is enforced by the order lookup.
        self.order_service.get_order(order_id, actor).await?;
        self.repository.find_by_order(order_id).await
    }

    /// Settlement position of an order: how much of the total is paid and
    /// what remains outstanding.
    pub async fn order_payment_summary(
        &self,
        order_id: Uuid,
        actor: &ActorContext,
    ) -> Result<OrderPaymentSummary, PaymentError> {
        let order = self.order_service.get_order(order_id, actor).await?.order;
        let total_paid = self.repository.total_paid(order_id).await?;
        let remaining = (order.total_amount.abs() - total_paid.abs()).max(Decimal::ZERO);

        Ok(OrderPaymentSummary {
            order_id,
            total_amount: order.total_amount,
            total_paid,
            remaining,
            fully_paid: covers_total(total_paid, order.total_amount),
        })
    }

    pub async fn list_payments(
        &self,
        query: GetPaymentsQuery,
        actor: &ActorContext,
    ) -> Result<Vec<Payment>, PaymentError> {
        let (scope_user, scope_store) = match actor.visibility() {
            Visibility::Own => (Some(actor.user_id), None),
            Visibility::Store => {
                let store_id = actor.store_id.ok_or(PaymentError::AccessDenied)?;
                (None, Some(store_id))
            }
            Visibility::Company | Visibility::All => (None, None),
        };

        self.repository
            .list(actor.company_id, &query, scope_user, scope_store)
            .await
    }

    pub async fn shift_summary(
        &self,
        shift_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Vec<PaymentSummaryRow>, PaymentError> {
        // Shift lookup applies the actor's visibility.
        self.shift_service
            .get_shift(shift_id, actor)
            .await
            .map_err(PaymentError::from)?;
        self.repository.shift_summary(shift_id).await
    }

    /// Move a payment to SUCCESS and run the settlement check
    async fn apply_success(
        &self,
        payment: Payment,
        provider_data: Option<&Value>,
    ) -> Result<Payment, PaymentError> {
        let updated = self
            .repository
            .transition_status(
                payment.id,
                PaymentStatus::Initiated,
                PaymentStatus::Success,
                None,
                provider_data,
            )
            .await?;

        let Some(updated) = updated else {
            // Lost the race against another confirmation path; nothing to do.
            return Ok(payment);
        };

        tracing::info!("Payment {} confirmed", updated.id);
        self.try_settle(updated.order_id).await?;
        Ok(updated)
    }

    /// Flip the order to PAID when its payments cover the total, then run
    /// the post-settlement hook (inventory restoration for reversals).
    async fn try_settle(&self, order_id: Uuid) -> Result<(), PaymentError> {
        if self.repository.settle_order_if_covered(order_id).await? {
            tracing::info!("Order {} fully settled", order_id);
            self.order_service
                .handle_settlement(order_id)
                .await
                .map_err(PaymentError::from)?;
        }
        Ok(())
    }

    async fn visible_payment(
        &self,
        payment_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .repository
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        let allowed = match actor.visibility() {
            Visibility::Own => payment.processed_by == actor.user_id,
            Visibility::Store => actor.store_id == Some(payment.store_id),
            Visibility::Company => payment.company_id == actor.company_id,
            Visibility::All => true,
        };
        if !allowed {
            return Err(PaymentError::AccessDenied);
        }

        Ok(payment)
    }
}
