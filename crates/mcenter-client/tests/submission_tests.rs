use mcenter_client::{
    Action, BackupStore, ClientError, ConsultationForm, ScriptClient, SubmissionOutcome,
};
use mcenter_core::diagnosis::form::DiagnosisForm;
use mcenter_core::diagnosis::scoring::DiagnosisAnswers;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

// Nothing listens on the discard port, so every request fails fast.
const UNREACHABLE: &str = "http://127.0.0.1:9/exec";

fn offline_client() -> ScriptClient {
    ScriptClient::new(UNREACHABLE, Duration::from_secs(2)).unwrap()
}

fn consultation() -> ConsultationForm {
    ConsultationForm {
        name: "이도윤".into(),
        phone: "010-9876-5432".into(),
        email: "doyun@example.com".into(),
        company: "도윤상회".into(),
        consultation_type: "경영진단".into(),
        consultation_area: "마케팅".into(),
        content: "온라인 판로 개척 상담 요청".into(),
        preferred_time: "평일 오전".into(),
        privacy_consent: true,
    }
}

fn diagnosis_form() -> DiagnosisForm {
    DiagnosisForm {
        company_name: "도윤상회".into(),
        contact_name: "이도윤".into(),
        phone: "01098765432".into(),
        email: "doyun@example.com".into(),
        industry: "소매업".into(),
        employee_count: "2".into(),
        business_years: "3".into(),
        annual_revenue: "1억".into(),
        main_concerns: String::new(),
        expected_benefits: String::new(),
        privacy_consent: true,
        answers: DiagnosisAnswers {
            product_service: vec![5, 5, 4, 4, 5],
            customer_service: vec![4, 4, 4, 4],
            marketing: vec![3, 3, 3, 3, 3],
            procurement: vec![2, 2, 3],
            store_management: vec![4, 5, 4],
        },
    }
}

#[test]
fn test_failed_consultation_is_backed_up() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());

    let outcome = offline_client()
        .submit_consultation(&store, &consultation())
        .unwrap();
    let path = match &outcome {
        SubmissionOutcome::BackedUp { path, .. } => path.clone(),
        other => panic!("expected backup, got {other:?}"),
    };
    assert!(outcome.user_message().contains("임시 저장"));

    let entries = store.list().unwrap();
    assert_eq!(entries.len(), 1);
    let (listed_path, entry) = &entries[0];
    assert_eq!(listed_path, &path);
    assert_eq!(entry.kind, "consultation");
    assert_eq!(entry.action, Action::SaveConsultation);
    assert_eq!(entry.payload["action"], json!("saveConsultation"));
    assert_eq!(entry.payload["name"], json!("이도윤"));
}

#[test]
fn test_invalid_consultation_is_not_backed_up() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());
    let mut form = consultation();
    form.privacy_consent = false;

    let err = offline_client().submit_consultation(&store, &form).unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_diagnosis_scored_even_when_offline() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());

    let (scored, outcome) = offline_client()
        .submit_diagnosis(&store, &diagnosis_form())
        .unwrap();
    assert!(!outcome.is_delivered());
    assert!(!scored.result.weaknesses.is_empty());

    let (_, entry) = &store.list().unwrap()[0];
    assert_eq!(entry.kind, "diagnosis");
    assert_eq!(entry.payload["companyName"], json!("도윤상회"));
    assert_eq!(
        entry.payload["totalScore"],
        json!(scored.result.total_score.to_string())
    );
}

#[test]
fn test_failed_resend_keeps_backup() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());
    let client = offline_client();
    client.submit_consultation(&store, &consultation()).unwrap();

    let (path, _) = store.list().unwrap().remove(0);
    assert!(client.resend_backup(&store, &path).is_err());
    assert!(path.exists());
}

#[test]
fn test_plain_submit_surfaces_transport_error() {
    let err = offline_client()
        .submit(Action::SaveConsultation, &consultation())
        .unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
