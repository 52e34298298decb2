use common::{PaymentDto, PaymentReceiptDto, ReceiptDto, ReversalDto};
use compute::money::round_money;
use compute::{PaymentOutcome, ReversalOutcome};
use model::entities::{payment, receipt};

/// Stored decimals may come back from SQLite with float noise, so every
/// amount is put back on two places before it leaves the server.
pub fn receipt_to_dto(model: &receipt::Model) -> ReceiptDto {
    ReceiptDto {
        id: model.id,
        condominium_id: model.condominium_id,
        property_id: model.property_id,
        period: model.period.clone(),
        amount: round_money(model.amount),
        pending_amount: model.pending_amount.map(round_money),
        outstanding: round_money(model.outstanding()),
        credit_balance: round_money(model.credit_balance),
        opening_credit: round_money(model.opening_credit),
        status: model.status.to_string(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn payment_to_dto(model: &payment::Model) -> PaymentDto {
    PaymentDto {
        id: model.id,
        receipt_id: model.receipt_id,
        condominium_id: model.condominium_id,
        amount: round_money(model.amount),
        method: model.method.clone(),
        status: model.status.to_string(),
        payment_details: model.payment_details.clone(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn outcome_to_dto(outcome: &PaymentOutcome) -> PaymentReceiptDto {
    PaymentReceiptDto {
        payment: payment_to_dto(&outcome.payment),
        receipt: receipt_to_dto(&outcome.receipt),
        credit_applied: round_money(outcome.credit_applied),
    }
}

pub fn reversal_to_dto(outcome: &ReversalOutcome) -> ReversalDto {
    ReversalDto {
        payment: payment_to_dto(&outcome.payment),
        receipt: receipt_to_dto(&outcome.receipt),
        credit_adjustment: round_money(outcome.credit_adjustment),
    }
}
