use mcenter_client::response::ResponseData;
use mcenter_client::{
    Action, BackupStore, ConsultationForm, DiagnosisResultUpdate, ScriptClient, SubmissionOutcome,
};
use mcenter_core::diagnosis::form::{self, DiagnosisForm};
use mcenter_core::diagnosis::scoring::DiagnosisAnswers;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const ACCEPTED: &str = r#"{"success":true,"message":"저장 완료","data":{"sheetSaved":true,"autoReplySent":true,"adminNotified":true}}"#;

/// Answer exactly one request with a canned response. The handle yields the
/// JSON body the client sent.
fn serve_once(status: &str, body: &str) -> (String, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/exec", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request_body(&mut stream);
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        serde_json::from_slice(&request).unwrap()
    });
    (url, handle)
}

fn read_request_body(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed before the request body arrived");
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let len: usize = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let body_start = head_end + 4;
        if buf.len() >= body_start + len {
            return buf[body_start..body_start + len].to_vec();
        }
    }
}

fn client(url: &str) -> ScriptClient {
    ScriptClient::new(url, Duration::from_secs(5)).unwrap()
}

fn consultation() -> ConsultationForm {
    ConsultationForm {
        name: "한서연".into(),
        phone: "010-2222-3333".into(),
        email: "seoyeon@example.com".into(),
        company: "서연베이커리".into(),
        consultation_type: "정책자금".into(),
        consultation_area: "운영자금".into(),
        content: "시설 확장 자금 상담".into(),
        preferred_time: "오후".into(),
        privacy_consent: true,
    }
}

fn diagnosis_form() -> DiagnosisForm {
    DiagnosisForm {
        company_name: "서연베이커리".into(),
        contact_name: "한서연".into(),
        phone: "01022223333".into(),
        email: "seoyeon@example.com".into(),
        industry: "음식점업".into(),
        employee_count: "4".into(),
        business_years: "6".into(),
        annual_revenue: "3억".into(),
        main_concerns: String::new(),
        expected_benefits: String::new(),
        privacy_consent: true,
        answers: DiagnosisAnswers {
            product_service: vec![4, 4, 4, 5, 4],
            customer_service: vec![5, 5, 4, 4],
            marketing: vec![2, 2, 3, 2, 2],
            procurement: vec![3, 3, 3],
            store_management: vec![4, 4, 3],
        },
    }
}

#[test]
fn test_accepted_consultation_is_delivered_with_flags() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());
    let (url, server) = serve_once("200 OK", ACCEPTED);

    let outcome = client(&url)
        .submit_consultation(&store, &consultation())
        .unwrap();
    let sent = server.join().unwrap();

    let resp = match &outcome {
        SubmissionOutcome::Delivered(resp) => resp,
        other => panic!("expected delivery, got {other:?}"),
    };
    assert!(resp.success);
    assert_eq!(resp.message.as_deref(), Some("저장 완료"));
    assert_eq!(
        resp.data,
        ResponseData {
            sheet_saved: true,
            auto_reply_sent: true,
            admin_notified: true,
        }
    );
    assert!(outcome.user_message().contains("확인 메일"));

    assert_eq!(sent["action"], json!("saveConsultation"));
    assert_eq!(sent["company"], json!("서연베이커리"));
    assert!(sent["submittedAt"].is_string());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_rejected_submission_is_backed_up_with_reason() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());
    let (url, server) = serve_once("200 OK", r#"{"success":false,"error":"시트 잠김"}"#);

    let outcome = client(&url)
        .submit_consultation(&store, &consultation())
        .unwrap();
    server.join().unwrap();

    let reason = match &outcome {
        SubmissionOutcome::BackedUp { reason, .. } => reason.clone(),
        other => panic!("expected backup, got {other:?}"),
    };
    assert!(reason.contains("시트 잠김"), "{reason}");

    let entries = store.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1.reason, reason);
    assert_eq!(entries[0].1.action, Action::SaveConsultation);
}

#[test]
fn test_server_error_status_is_backed_up() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());
    let (url, server) = serve_once("500 Internal Server Error", "Exception: quota exceeded");

    let (scored, outcome) = client(&url)
        .submit_diagnosis(&store, &diagnosis_form())
        .unwrap();
    let sent = server.join().unwrap();

    assert_eq!(sent["action"], json!("saveDiagnosis"));
    match &outcome {
        SubmissionOutcome::BackedUp { reason, .. } => {
            assert!(reason.contains("HTTP 500"), "{reason}");
            assert!(reason.contains("quota exceeded"), "{reason}");
        }
        other => panic!("expected backup, got {other:?}"),
    }
    let (_, entry) = &store.list().unwrap()[0];
    assert_eq!(entry.kind, "diagnosis");
    assert_eq!(
        entry.payload["totalScore"],
        json!(scored.result.total_score.to_string())
    );
}

#[test]
fn test_unparseable_body_is_backed_up() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());
    let (url, server) = serve_once("200 OK", "<html>로그인이 필요합니다</html>");

    let outcome = client(&url)
        .submit_consultation(&store, &consultation())
        .unwrap();
    server.join().unwrap();

    assert!(!outcome.is_delivered());
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_successful_resend_deletes_backup() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());
    let offline = ScriptClient::new("http://127.0.0.1:9/exec", Duration::from_secs(2)).unwrap();
    offline.submit_consultation(&store, &consultation()).unwrap();
    let (path, entry) = store.list().unwrap().remove(0);

    let (url, server) = serve_once("200 OK", ACCEPTED);
    let resp = client(&url).resend_backup(&store, &path).unwrap();
    let sent = server.join().unwrap();

    assert!(resp.data.sheet_saved);
    assert_eq!(sent, entry.payload);
    assert!(!path.exists());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_diagnosis_result_update_is_delivered() {
    let dir = tempfile::tempdir().unwrap();
    let store = BackupStore::new(dir.path());
    let form = diagnosis_form();
    let scored = form::diagnose(&form).unwrap();
    let update =
        DiagnosisResultUpdate::from_result(&form.company_name, &form.email, &scored.result);
    let (url, server) = serve_once("200 OK", r#"{"success":true,"data":{"sheetSaved":true}}"#);

    let outcome = client(&url)
        .update_diagnosis_result(&store, &update)
        .unwrap();
    let sent = server.join().unwrap();

    assert!(outcome.is_delivered());
    assert_eq!(sent["action"], json!("updateDiagnosisResult"));
    assert_eq!(sent["companyName"], json!("서연베이커리"));
    assert_eq!(sent["email"], json!("seoyeon@example.com"));
    assert_eq!(sent["totalScore"], json!(update.total_score));
    assert_eq!(sent["weaknesses"], json!(update.weaknesses));
}
