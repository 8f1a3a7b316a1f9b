#![allow(dead_code)]

use std::sync::Arc;

use coverage_contract::CoverageContract;
use coverage_contract::config::{AppConfig, BusBackend};
use coverage_db_memory::InMemoryWorldState;
use coverage_notifications::MemoryEventBus;
use serde_json::{Value, json};

pub struct Ledger {
    pub contract: CoverageContract,
    pub bus: MemoryEventBus,
    pub state: InMemoryWorldState,
}

pub fn ledger() -> Ledger {
    ledger_with(AppConfig::default())
}

/// A ledger on the memory bus, wired from `config`.
pub fn ledger_with(mut config: AppConfig) -> Ledger {
    config.event_bus.backend = BusBackend::Memory;

    let bus = MemoryEventBus::new();
    let state = InMemoryWorldState::new();
    let contract = CoverageContract::with_bus(&config, Arc::new(state.clone()), Arc::new(bus.clone()));
    Ledger {
        contract,
        bus,
        state,
    }
}

pub fn patient(id: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "id": id,
        "active": true,
        "name": [{"family": "Doe", "given": ["Jane"]}],
        "gender": "female",
        "birthDate": "1980-02-29"
    })
}

pub fn organization(id: &str) -> Value {
    json!({
        "resourceType": "Organization",
        "id": id,
        "active": true,
        "name": "Benefits Inc"
    })
}

pub fn coverage() -> Value {
    json!({
        "resourceType": "Coverage",
        "id": "cov1",
        "status": "active",
        "beneficiary": {"reference": "Patient/p1"},
        "subscriber": {"reference": "Patient/p1"},
        "payor": [{"reference": "Organization/ins1"}],
        "period": {"start": "2024-01-01", "end": "2024-12-31"}
    })
}

pub fn eligibility_request(created: &str) -> Value {
    json!({
        "resourceType": "CoverageEligibilityRequest",
        "id": "req1",
        "status": "active",
        "purpose": ["validation"],
        "patient": {"reference": "Patient/p1"},
        "created": created,
        "insurer": {"reference": "Organization/ins1"},
        "insurance": [{"focal": true, "coverage": {"reference": "Coverage/cov1"}}]
    })
}

pub fn text(value: &Value) -> String {
    serde_json::to_string(value).unwrap()
}

/// Seeds the patient, insurer and coverage the eligibility request refers to.
pub async fn seed(ledger: &Ledger) {
    for doc in [patient("p1"), organization("ins1"), coverage()] {
        let response = ledger
            .contract
            .add_resource("", &text(&doc), time::macros::date!(2024 - 06 - 15))
            .await
            .unwrap();
        assert!(response.is_none());
    }
}
