#[derive(Debug, Clone)]
pub struct Authorize;

#[derive(Debug, Clone)]
pub struct CompleteAuthorize;

#[derive(Debug, Clone)]
pub struct PSync;

#[derive(Debug, Clone)]
pub struct Void;

#[derive(Debug, Clone)]
pub struct Refund;

#[derive(Debug, Clone)]
pub struct Capture;

#[derive(Debug, Clone)]
pub struct SetupMandate;

#[derive(Debug, Clone)]
pub struct RepeatPayment;

#[derive(Debug, Clone)]
pub struct CreateSessionToken;

#[derive(Debug, Clone)]
pub struct PaymentMethodToken;

#[derive(Debug, Clone)]
pub struct VoidPC;

#[derive(Debug, Clone)]
pub struct MandateRevoke;

#[derive(strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FlowName {
    Authorize,
    CompleteAuthorize,
    Refund,
    Psync,
    Void,
    VoidPc,
    SetupMandate,
    RepeatPayment,
    Capture,
    IncomingWebhook,
    CreateSessionToken,
    PaymentMethodToken,
    MandateRevoke,
}
