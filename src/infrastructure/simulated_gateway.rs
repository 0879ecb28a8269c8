use crate::domain::gateway::{
    CaptureMethod, Charge, GatewayError, GatewayResult, PaymentIntent, PaymentIntentRequest,
    Refund,
};
use crate::domain::ports::GatewayClient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct GatewayState {
    next_id: u64,
    charges: HashMap<String, Charge>,
    payment_intents: HashMap<String, PaymentIntent>,
    declined_charges: HashMap<String, GatewayError>,
    declined_payment_methods: HashMap<String, GatewayError>,
    intent_status_override: Option<String>,
    refund_error: Option<GatewayError>,
}

impl GatewayState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }
}

/// In-process payment processor honoring the gateway contract.
///
/// Used for scenario replay and tests; declines and odd statuses are injected
/// through the setup methods.
#[derive(Default, Clone)]
pub struct SimulatedGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an authorized, uncaptured charge.
    pub async fn authorize_charge(
        &self,
        charge_id: &str,
        amount: i64,
        payment_method: &str,
        destination: &str,
    ) {
        let mut state = self.state.lock().await;
        state.charges.insert(
            charge_id.to_string(),
            Charge {
                id: charge_id.to_string(),
                amount,
                payment_method: Some(payment_method.to_string()),
                destination: Some(destination.to_string()),
                captured: false,
            },
        );
    }

    /// Makes every capture of `charge_id` fail with `error`.
    pub async fn decline_charge(&self, charge_id: &str, error: GatewayError) {
        let mut state = self.state.lock().await;
        state.declined_charges.insert(charge_id.to_string(), error);
    }

    /// Makes authorizations against `payment_method` end in `requires_payment_method`.
    pub async fn decline_payment_method(&self, payment_method: &str, error: GatewayError) {
        let mut state = self.state.lock().await;
        state
            .declined_payment_methods
            .insert(payment_method.to_string(), error);
    }

    /// Forces the status reported for newly created authorizations.
    pub async fn override_intent_status(&self, status: Option<&str>) {
        let mut state = self.state.lock().await;
        state.intent_status_override = status.map(str::to_string);
    }

    pub async fn fail_refunds(&self, error: Option<GatewayError>) {
        let mut state = self.state.lock().await;
        state.refund_error = error;
    }

    pub async fn charge(&self, charge_id: &str) -> Option<Charge> {
        let state = self.state.lock().await;
        state.charges.get(charge_id).cloned()
    }
}

fn missing(kind: &str, id: &str) -> GatewayError {
    GatewayError {
        code: Some("resource_missing".to_string()),
        message: Some(format!("No such {kind}: '{id}'")),
        decline_code: None,
        charge: None,
    }
}

#[async_trait]
impl GatewayClient for SimulatedGateway {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> GatewayResult<PaymentIntent> {
        let mut state = self.state.lock().await;
        let intent_id = state.next_id("pi");
        let charge_id = state.next_id("ch");

        let decline = state
            .declined_payment_methods
            .get(&request.payment_method)
            .cloned();
        let status = match (&decline, &state.intent_status_override) {
            (Some(_), _) => "requires_payment_method".to_string(),
            (None, Some(status)) => status.clone(),
            (None, None) => match request.capture_method {
                CaptureMethod::Manual => "requires_capture".to_string(),
                CaptureMethod::Automatic => "succeeded".to_string(),
            },
        };

        if decline.is_none() {
            state.charges.insert(
                charge_id.clone(),
                Charge {
                    id: charge_id.clone(),
                    amount: request.amount,
                    payment_method: Some(request.payment_method.clone()),
                    destination: Some(request.transfer_data.destination.clone()),
                    captured: request.capture_method == CaptureMethod::Automatic,
                },
            );
        }
        let payment_intent = PaymentIntent {
            id: intent_id.clone(),
            amount: request.amount,
            status,
            payment_method: Some(request.payment_method),
            transfer_data: Some(request.transfer_data),
            charges: if decline.is_none() {
                vec![charge_id]
            } else {
                vec![]
            },
            last_payment_error: decline,
        };
        state
            .payment_intents
            .insert(intent_id, payment_intent.clone());
        Ok(payment_intent)
    }

    async fn retrieve_payment_intent(&self, id: &str) -> GatewayResult<PaymentIntent> {
        let state = self.state.lock().await;
        state
            .payment_intents
            .get(id)
            .cloned()
            .ok_or_else(|| missing("payment_intent", id))
    }

    async fn capture_payment_intent(&self, id: &str) -> GatewayResult<PaymentIntent> {
        let mut state = self.state.lock().await;
        let payment_intent = state
            .payment_intents
            .get_mut(id)
            .ok_or_else(|| missing("payment_intent", id))?;
        if payment_intent.status != "requires_capture" {
            return Err(GatewayError {
                code: Some("payment_intent_unexpected_state".to_string()),
                message: Some(format!(
                    "This PaymentIntent could not be captured because it has a status of {}.",
                    payment_intent.status
                )),
                ..Default::default()
            });
        }
        payment_intent.status = "succeeded".to_string();
        let captured = payment_intent.clone();
        for charge_id in &captured.charges {
            if let Some(charge) = state.charges.get_mut(charge_id) {
                charge.captured = true;
            }
        }
        Ok(captured)
    }

    async fn retrieve_charge(&self, id: &str) -> GatewayResult<Charge> {
        let state = self.state.lock().await;
        state
            .charges
            .get(id)
            .cloned()
            .ok_or_else(|| missing("charge", id))
    }

    async fn capture_charge(&self, id: &str) -> GatewayResult<Charge> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.declined_charges.get(id) {
            let mut error = error.clone();
            error.charge.get_or_insert_with(|| id.to_string());
            return Err(error);
        }
        let charge = state
            .charges
            .get_mut(id)
            .ok_or_else(|| missing("charge", id))?;
        if charge.captured {
            return Err(GatewayError {
                code: Some("charge_already_captured".to_string()),
                message: Some(format!("Charge {id} has already been captured.")),
                charge: Some(id.to_string()),
                ..Default::default()
            });
        }
        charge.captured = true;
        Ok(charge.clone())
    }

    async fn create_refund(&self, charge_id: &str, _reverse_transfer: bool) -> GatewayResult<Refund> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.refund_error.clone() {
            return Err(error);
        }
        if !state.charges.contains_key(charge_id) {
            return Err(missing("charge", charge_id));
        }
        let refund_id = state.next_id("re");
        Ok(Refund {
            id: refund_id,
            charge: charge_id.to_string(),
        })
    }
}
