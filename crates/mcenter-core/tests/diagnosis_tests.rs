use mcenter_core::diagnosis::form::{self, DiagnosisForm};
use mcenter_core::diagnosis::scoring::{self, Category, DiagnosisAnswers, Grade, Level};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn answers(ps: [u8; 5], cs: [u8; 4], mk: [u8; 5], pr: [u8; 3], sm: [u8; 3]) -> DiagnosisAnswers {
    DiagnosisAnswers {
        product_service: ps.to_vec(),
        customer_service: cs.to_vec(),
        marketing: mk.to_vec(),
        procurement: pr.to_vec(),
        store_management: sm.to_vec(),
    }
}

#[test]
fn test_weighted_total() {
    // Means: 4, 3, 2, 5, 4
    let a = answers([4; 5], [3; 4], [2; 5], [5; 3], [4; 3]);
    let out = scoring::score_diagnosis(&a).unwrap();
    // (0.25*4 + 0.20*3 + 0.25*2 + 0.15*5 + 0.15*4) * 20 = 3.45 * 20 = 69
    assert_eq!(out.result.total_score, dec!(69));
    assert_eq!(out.result.grade, Grade::C);
}

#[test]
fn test_category_scores_are_unweighted_means() {
    let a = answers([5, 4, 3, 2, 1], [5, 5, 4, 4], [1, 2, 3, 4, 5], [2, 3, 4], [1, 1, 4]);
    let out = scoring::score_diagnosis(&a).unwrap();
    let averages: Vec<Decimal> = out.result.categories.iter().map(|c| c.average).collect();
    assert_eq!(averages, vec![dec!(3), dec!(4.5), dec!(3), dec!(3), dec!(2)]);
}

#[test]
fn test_total_always_within_bounds() {
    for v in 1..=5u8 {
        for w in 1..=5u8 {
            let a = answers([v; 5], [w; 4], [v; 5], [w; 3], [v; 3]);
            let total = scoring::score_diagnosis(&a).unwrap().result.total_score;
            assert!(total >= Decimal::ZERO && total <= dec!(100), "total {total}");
        }
    }
}

#[test]
fn test_strengths_and_weaknesses() {
    let a = answers([4; 5], [3; 4], [2; 5], [5; 3], [4, 3, 4]);
    let out = scoring::score_diagnosis(&a).unwrap();
    let strengths: Vec<Category> = out.result.strengths.iter().map(|f| f.category).collect();
    let weaknesses: Vec<Category> = out.result.weaknesses.iter().map(|f| f.category).collect();
    assert_eq!(strengths, vec![Category::ProductService, Category::Procurement]);
    assert_eq!(weaknesses, vec![Category::CustomerService, Category::Marketing]);
    // Store management averages 3.67: neither
    let store = &out.result.categories[4];
    assert_eq!(store.level, Level::Neutral);
    // Weakest category is recommended first
    assert_eq!(out.result.recommendations.len(), 3);
    assert!(out.result.recommendations[0].contains("SNS"));
}

#[test]
fn test_grade_bands() {
    assert_eq!(Grade::from_score(dec!(90)), Grade::S);
    assert_eq!(Grade::from_score(dec!(89.9)), Grade::A);
    assert_eq!(Grade::from_score(dec!(70)), Grade::B);
    assert_eq!(Grade::from_score(dec!(60)), Grade::C);
    assert_eq!(Grade::from_score(dec!(59.9)), Grade::D);
}

#[test]
fn test_form_from_site_json() {
    let json = r#"{
        "companyName": "청춘분식",
        "contactName": "이영호",
        "phone": "01098765432",
        "email": "young@example.com",
        "industry": "음식점업",
        "employeeCount": "2",
        "privacyConsent": true,
        "productService": [3, 3, 4, 4, 3],
        "customerService": [4, 4, 4, 4],
        "marketing": [2, 2, 3, 2, 2],
        "procurement": [3, 3, 3],
        "storeManagement": [4, 5, 4]
    }"#;
    let form: DiagnosisForm = serde_json::from_str(json).unwrap();
    assert_eq!(form.main_concerns, "");
    let out = form::diagnose(&form).unwrap();
    assert_eq!(out.result.categories.len(), 5);
    assert_eq!(out.result.weaknesses.len(), 2);
}

#[test]
fn test_result_serialises_with_snake_case_categories() {
    let out = scoring::score_diagnosis(&answers([3; 5], [3; 4], [3; 5], [3; 3], [3; 3])).unwrap();
    let value = serde_json::to_value(&out.result).unwrap();
    assert_eq!(value["categories"][0]["category"], "product_service");
    assert_eq!(value["grade"], "C");
}
