//! バックエンドとやり取りするデータ型
//!
//! CLIと共有される型:
//! - EquipmentRow: アップロードされたCSVの1行（キーは行ごとに揺れる）
//! - StatsSummary: バックエンドが算出した集計値
//! - HistoryEntry: 過去のアップロード
//! - *Response: 各エンドポイントのレスポンス

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// 値が解決できなかったフィールドの表示
pub const MISSING_TEXT: &str = "-";

/// グリッド・レポートに表示する5項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayField {
    Name,
    Type,
    Pressure,
    Temperature,
    Status,
}

/// 表示順
pub const DISPLAY_FIELDS: [DisplayField; 5] = [
    DisplayField::Name,
    DisplayField::Type,
    DisplayField::Pressure,
    DisplayField::Temperature,
    DisplayField::Status,
];

impl DisplayField {
    /// 優先して参照するキー
    pub fn canonical_key(&self) -> &'static str {
        match self {
            DisplayField::Name => "Equipment Name",
            DisplayField::Type => "Type",
            DisplayField::Pressure => "Pressure",
            DisplayField::Temperature => "Temperature",
            DisplayField::Status => "Status",
        }
    }

    /// canonicalキーが無い場合の別名（小文字キー）
    pub fn alias_key(&self) -> Option<&'static str> {
        match self {
            DisplayField::Name => Some("name"),
            DisplayField::Type => Some("type"),
            DisplayField::Pressure => Some("pressure"),
            DisplayField::Temperature => Some("temp"),
            DisplayField::Status => None,
        }
    }

    /// 列見出し
    pub fn header(&self) -> &'static str {
        match self {
            DisplayField::Name => "Name",
            DisplayField::Type => "Type",
            DisplayField::Pressure => "Pressure",
            DisplayField::Temperature => "Temp",
            DisplayField::Status => "Status",
        }
    }
}

/// 設備データ1行
///
/// バックエンドはCSVの列名をそのままキーにして返すため、型は緩い。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentRow(Map<String, Value>);

impl EquipmentRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// キーと値を追加したRowを返す（テスト・組み立て用）
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for EquipmentRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// フィールド解決結果
///
/// null と空文字は欠損として扱う（バックエンドは空セルを "" で埋める）。
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Present(Value),
    Missing,
}

impl Field {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Field::Missing,
            Some(Value::String(s)) if s.is_empty() => Field::Missing,
            Some(v) => Field::Present(v.clone()),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    /// 数値として解釈（文字列の数値も許容）
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Present(Value::Number(n)) => n.as_f64(),
            Field::Present(Value::String(s)) => {
                s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
            }
            _ => None,
        }
    }

    /// 表示文字列
    pub fn display(&self) -> String {
        match self {
            Field::Present(Value::String(s)) => s.clone(),
            Field::Present(v) => v.to_string(),
            Field::Missing => MISSING_TEXT.to_string(),
        }
    }
}

/// 種別ごとの件数（バックエンドの返却順を保持）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDistribution(Vec<(String, u64)>);

impl TypeDistribution {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut dist = Self::default();
        for (name, count) in pairs {
            dist.insert(name.into(), count);
        }
        dist
    }

    /// 同名キーは上書き（位置は最初の出現のまま）
    fn insert(&mut self, name: String, count: u64) {
        if let Some(entry) = self.0.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = count;
        } else {
            self.0.push((name, count));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(n, c)| (n.as_str(), *c))
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TypeDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TypeDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DistributionVisitor;

        impl<'de> Visitor<'de> for DistributionVisitor {
            type Value = TypeDistribution;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of type name to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut dist = TypeDistribution::default();
                while let Some((name, raw)) = access.next_entry::<String, Value>()? {
                    let count = count_from_value(&raw).ok_or_else(|| {
                        de::Error::custom(format!("invalid count for type {:?}: {}", name, raw))
                    })?;
                    dist.insert(name, count);
                }
                Ok(dist)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(TypeDistribution::default())
            }
        }

        deserializer.deserialize_any(DistributionVisitor)
    }
}

fn count_from_value(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| *f >= 0.0 && f.fract() == 0.0)
        .map(|f| f as u64)
}

/// バックエンドが算出した集計値
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    #[serde(default)]
    pub total_count: u64,

    #[serde(default)]
    pub avg_pressure: f64,

    #[serde(default)]
    pub avg_temp: f64,

    #[serde(default)]
    pub type_distribution: TypeDistribution,
}

/// アップロード履歴
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// アップロード直後のレスポンスには含まれないことがある
    #[serde(default)]
    pub id: Option<i64>,

    pub file_name: String,

    #[serde(default)]
    pub uploaded_at: String,

    #[serde(default)]
    pub total_records: Option<u64>,
}

impl HistoryEntry {
    /// 日付部分のみ: "2026-01-18T09:30:00.123Z" → "2026-01-18"
    pub fn uploaded_date(&self) -> String {
        let raw = self.uploaded_at.trim();
        if raw.is_empty() {
            return MISSING_TEXT.to_string();
        }
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return dt.format("%Y-%m-%d").to_string();
        }
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return dt.format("%Y-%m-%d").to_string();
        }
        raw.to_string()
    }
}

/// POST /api/login/, /api/register/ のリクエスト
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// POST /api/login/, /api/register/ のレスポンス
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub username: String,
}

/// POST /api/upload/ のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub data: Vec<EquipmentRow>,
    #[serde(default)]
    pub stats: Option<StatsSummary>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// GET /api/upload/ のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// GET /api/history/{id}/ のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryItemResponse {
    #[serde(default)]
    pub data: Vec<EquipmentRow>,
    #[serde(default)]
    pub stats: Option<StatsSummary>,
}
