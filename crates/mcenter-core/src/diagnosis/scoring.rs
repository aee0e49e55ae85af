use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::McenterError;
use crate::types::{with_metadata, ComputationOutput};
use crate::McenterResult;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ProductService,
    CustomerService,
    Marketing,
    Procurement,
    StoreManagement,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ProductService,
        Category::CustomerService,
        Category::Marketing,
        Category::Procurement,
        Category::StoreManagement,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::ProductService => "상품/서비스 역량",
            Category::CustomerService => "고객응대 역량",
            Category::Marketing => "마케팅 역량",
            Category::Procurement => "구매/재고관리",
            Category::StoreManagement => "매장관리 역량",
        }
    }

    /// Share of the total score; the five weights sum to 1.
    pub fn weight(self) -> Decimal {
        match self {
            Category::ProductService => dec!(0.25),
            Category::CustomerService => dec!(0.20),
            Category::Marketing => dec!(0.25),
            Category::Procurement => dec!(0.15),
            Category::StoreManagement => dec!(0.15),
        }
    }

    pub fn item_count(self) -> usize {
        match self {
            Category::ProductService => 5,
            Category::CustomerService => 4,
            Category::Marketing => 5,
            Category::Procurement => 3,
            Category::StoreManagement => 3,
        }
    }

    fn strength_message(self) -> &'static str {
        match self {
            Category::ProductService => {
                "상품과 서비스의 경쟁력이 우수하여 고객에게 차별화된 가치를 제공하고 있습니다."
            }
            Category::CustomerService => {
                "고객 응대 수준이 높아 재방문과 추천으로 이어질 가능성이 큽니다."
            }
            Category::Marketing => {
                "온·오프라인 홍보 활동이 체계적으로 운영되어 신규 고객 유입이 원활합니다."
            }
            Category::Procurement => "구매와 재고 관리가 효율적으로 이루어져 원가 관리가 안정적입니다.",
            Category::StoreManagement => "매장 환경과 운영 관리가 잘 정비되어 있습니다.",
        }
    }

    fn weakness_message(self) -> &'static str {
        match self {
            Category::ProductService => "상품 구성과 품질 관리에 개선이 필요합니다.",
            Category::CustomerService => "고객 응대 프로세스와 불만 처리 체계를 보완해야 합니다.",
            Category::Marketing => "홍보 채널이 부족하여 고객 확보에 어려움이 예상됩니다.",
            Category::Procurement => "재고 과다 또는 품절 위험이 있어 구매 관리 체계화가 필요합니다.",
            Category::StoreManagement => "매장 청결, 진열, 인력 운영 등 기본 관리 수준을 높여야 합니다.",
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            Category::ProductService => "주력 상품 재정비 및 품질 표준화 컨설팅",
            Category::CustomerService => "고객 응대 매뉴얼 수립 및 서비스 교육",
            Category::Marketing => "SNS·온라인 플랫폼 마케팅 지원사업 활용",
            Category::Procurement => "POS 기반 재고관리 시스템 도입",
            Category::StoreManagement => "스마트상점 기술보급사업 및 매장 환경개선 지원",
        }
    }
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Likert answers (1-5) grouped by category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisAnswers {
    pub product_service: Vec<u8>,
    pub customer_service: Vec<u8>,
    pub marketing: Vec<u8>,
    pub procurement: Vec<u8>,
    pub store_management: Vec<u8>,
}

impl DiagnosisAnswers {
    pub fn items(&self, category: Category) -> &[u8] {
        match category {
            Category::ProductService => &self.product_service,
            Category::CustomerService => &self.customer_service,
            Category::Marketing => &self.marketing,
            Category::Procurement => &self.procurement,
            Category::StoreManagement => &self.store_management,
        }
    }

    pub fn validate(&self) -> McenterResult<()> {
        for category in Category::ALL {
            let items = self.items(category);
            if items.len() != category.item_count() {
                return Err(McenterError::InvalidInput {
                    field: format!("{category:?}"),
                    reason: format!(
                        "expected {} answers, got {}",
                        category.item_count(),
                        items.len()
                    ),
                });
            }
            if let Some((i, v)) = items.iter().enumerate().find(|(_, v)| !(1..=5).contains(*v)) {
                return Err(McenterError::InvalidInput {
                    field: format!("{category:?}[{i}]"),
                    reason: format!("answers must be between 1 and 5, got {v}"),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(score: Decimal) -> Self {
        if score >= dec!(90) {
            Grade::S
        } else if score >= dec!(80) {
            Grade::A
        } else if score >= dec!(70) {
            Grade::B
        } else if score >= dec!(60) {
            Grade::C
        } else {
            Grade::D
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Grade::S => "최우수: 경영 전반이 매우 안정적입니다.",
            Grade::A => "우수: 일부 영역만 보완하면 성장 여력이 큽니다.",
            Grade::B => "양호: 핵심 약점 개선이 필요합니다.",
            Grade::C => "보통: 여러 영역에서 체계적인 개선이 필요합니다.",
            Grade::D => "미흡: 전문 컨설팅을 통한 경영 진단이 시급합니다.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Strength,
    Neutral,
    Weakness,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub label: String,
    pub weight: Decimal,
    /// Unweighted mean of the category's answers, 1-5
    pub average: Decimal,
    /// Contribution to the 100-point total
    pub weighted_score: Decimal,
    pub level: Level,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// 0-100
    pub total_score: Decimal,
    pub grade: Grade,
    pub grade_description: String,
    pub categories: Vec<CategoryScore>,
    pub strengths: Vec<Finding>,
    pub weaknesses: Vec<Finding>,
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const STRENGTH_THRESHOLD: Decimal = dec!(4.0);
const WEAKNESS_THRESHOLD: Decimal = dec!(3.0);
/// Maps a weighted 1-5 average onto a 100-point scale
const SCALE: Decimal = dec!(20);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Mean of a category's answers
pub fn category_average(items: &[u8]) -> Decimal {
    if items.is_empty() {
        return Decimal::ZERO;
    }
    let sum: u32 = items.iter().map(|v| u32::from(*v)).sum();
    Decimal::from(sum) / Decimal::from(items.len() as u64)
}

pub fn classify(average: Decimal) -> Level {
    if average >= STRENGTH_THRESHOLD {
        Level::Strength
    } else if average <= WEAKNESS_THRESHOLD {
        Level::Weakness
    } else {
        Level::Neutral
    }
}

/// Score a completed self-diagnosis.
pub fn score_diagnosis(
    answers: &DiagnosisAnswers,
) -> McenterResult<ComputationOutput<DiagnosisResult>> {
    let start = Instant::now();
    answers.validate()?;

    let categories: Vec<CategoryScore> = Category::ALL
        .iter()
        .map(|&category| {
            let average = category_average(answers.items(category));
            CategoryScore {
                category,
                label: category.label().to_string(),
                weight: category.weight(),
                average,
                weighted_score: average * category.weight() * SCALE,
                level: classify(average),
            }
        })
        .collect();

    let total_score: Decimal = categories.iter().map(|c| c.weighted_score).sum();
    let grade = Grade::from_score(total_score);

    let finding = |c: &CategoryScore, message: &str| Finding {
        category: c.category,
        label: c.label.clone(),
        message: message.to_string(),
    };
    let strengths: Vec<Finding> = categories
        .iter()
        .filter(|c| c.level == Level::Strength)
        .map(|c| finding(c, c.category.strength_message()))
        .collect();
    let weaknesses: Vec<Finding> = categories
        .iter()
        .filter(|c| c.level == Level::Weakness)
        .map(|c| finding(c, c.category.weakness_message()))
        .collect();

    // Weakest categories first
    let mut ranked: Vec<&CategoryScore> = categories
        .iter()
        .filter(|c| c.level != Level::Strength)
        .collect();
    ranked.sort_by(|a, b| a.average.cmp(&b.average));
    let recommendations = ranked
        .iter()
        .map(|c| c.category.recommendation().to_string())
        .collect();

    let result = DiagnosisResult {
        total_score: total_score.round_dp(1),
        grade,
        grade_description: grade.description().to_string(),
        categories,
        strengths,
        weaknesses,
        recommendations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Weighted Likert self-diagnosis (5 categories, 20 items)",
        &serde_json::json!({
            "weights": { "product_service": "25%", "customer_service": "20%", "marketing": "25%",
                         "procurement": "15%", "store_management": "15%" },
            "strength_threshold": STRENGTH_THRESHOLD.to_string(),
            "weakness_threshold": WEAKNESS_THRESHOLD.to_string(),
            "grade_bands": { "S": "90-100", "A": "80-89", "B": "70-79", "C": "60-69", "D": "0-59" },
        }),
        Vec::new(),
        elapsed,
        result,
    ))
}
