//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 제품 데이터베이스 응답에서 디코딩되는 제품 레코드와
//! 카메라 디코더가 지원하는 심볼로지를 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// 바코드 심볼로지
///
/// 카메라 디코더가 인식하는 네 가지 인코딩 표준입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    /// EAN-8
    #[serde(rename = "ean-8")]
    Ean8,
    /// EAN-13
    #[serde(rename = "ean-13")]
    Ean13,
    /// UPC-E
    #[serde(rename = "upc-e")]
    UpcE,
    /// Code128
    #[serde(rename = "code128")]
    Code128,
}

impl Symbology {
    /// 지원되는 모든 심볼로지를 반환합니다.
    pub fn all() -> [Symbology; 4] {
        [Self::Ean8, Self::Ean13, Self::UpcE, Self::Code128]
    }

    /// 심볼로지 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ean8 => "ean-8",
            Self::Ean13 => "ean-13",
            Self::UpcE => "upc-e",
            Self::Code128 => "code128",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbology {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ean-8" => Ok(Self::Ean8),
            "ean-13" => Ok(Self::Ean13),
            "upc-e" => Ok(Self::UpcE),
            "code128" => Ok(Self::Code128),
            other => Err(ConfigError::InvalidValue {
                field: "symbologies".to_owned(),
                reason: format!("unknown symbology '{other}'"),
            }),
        }
    }
}

/// 제품 레코드
///
/// 제품 데이터베이스 조회 응답에서 디코딩되는 불변 레코드입니다.
/// `id`는 소스 데이터베이스의 전역 고유 식별자(바코드 문자열)입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 바코드 문자열 (전역 고유 식별자)
    #[serde(rename = "code")]
    pub id: String,
    /// 표시 이름
    #[serde(rename = "product_name")]
    pub name: String,
    /// 브랜드 (쉼표로 구분된 문자열)
    #[serde(default)]
    pub brands: Option<String>,
    /// 성분 목록
    #[serde(rename = "ingredients_hierarchy", default)]
    pub ingredients: Option<Vec<Ingredient>>,
    /// 100g당 영양 성분
    pub nutriments: Nutriments,
    /// 제품 이미지 URL
    #[serde(rename = "image_url", default)]
    pub image_url: Option<String>,
    /// 영양 등급 (A-E, 소스에서 검증 없이 전달)
    #[serde(rename = "nutrition_grade_fr", default)]
    pub nutrition_grade: Option<String>,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

/// 제품 성분
///
/// 소스 데이터는 로케일 접두어가 붙은 태그(`en:sugar` 형식)로 도착합니다.
/// 생성 시 접두어를 제거하고 슬러그만 저장합니다.
/// 불변식: 저장된 id에는 접두어가 남아 있지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    /// 정규화된 성분 토큰
    pub id: String,
}

impl Ingredient {
    /// 네임스페이스 태그에서 성분을 생성합니다.
    ///
    /// 첫 `:`까지의 접두어를 제거합니다. 접두어가 없으면 그대로 사용합니다
    /// (접두어 제거에 대해 멱등).
    pub fn from_tag(tag: &str) -> Self {
        let id = match tag.split_once(':') {
            Some((_, slug)) => slug.to_owned(),
            None => tag.to_owned(),
        };
        Self { id }
    }
}

impl<'de> Deserialize<'de> for Ingredient {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&raw))
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// 100g당 영양 성분
///
/// 일곱 개의 선택적 수치 필드입니다. 에너지는 kcal, 나머지는 그램 단위입니다.
/// `None`은 "소스가 보고하지 않음"을 의미하며 0이 아닙니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutriments {
    /// 에너지 (kcal/100g)
    #[serde(rename = "energy-kcal_100g", default)]
    pub energy: Option<f64>,
    /// 단백질 (g/100g)
    #[serde(rename = "proteins_100g", default)]
    pub proteins: Option<f64>,
    /// 탄수화물 (g/100g)
    #[serde(rename = "carbohydrates_100g", default)]
    pub carbohydrates: Option<f64>,
    /// 지방 (g/100g)
    #[serde(rename = "fat_100g", default)]
    pub fat: Option<f64>,
    /// 당류 (g/100g)
    #[serde(rename = "sugars_100g", default)]
    pub sugar: Option<f64>,
    /// 식이섬유 (g/100g)
    #[serde(rename = "fiber_100g", default)]
    pub fiber: Option<f64>,
    /// 염분 (g/100g)
    #[serde(rename = "salt_100g", default)]
    pub salt: Option<f64>,
}
