use serde::Serialize;
use std::fmt;

/// Independent data sources behind the security dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardSource {
    TrafficAnalysis,
    ThreatScores,
    ThreatIndicators,
    ThreatTrends,
    AttackedEndpoints,
}

impl DashboardSource {
    pub const ALL: [DashboardSource; 5] = [
        DashboardSource::TrafficAnalysis,
        DashboardSource::ThreatScores,
        DashboardSource::ThreatIndicators,
        DashboardSource::ThreatTrends,
        DashboardSource::AttackedEndpoints,
    ];

    /// Request path; only the attack list is paginated.
    pub fn path(&self, page: u32, page_size: u32) -> String {
        match self {
            DashboardSource::TrafficAnalysis => "/security/traffic-analysis".to_string(),
            DashboardSource::ThreatScores => "/security/threat-score".to_string(),
            DashboardSource::ThreatIndicators => "/security/threat-indicators".to_string(),
            DashboardSource::ThreatTrends => "/security/threat-trends".to_string(),
            DashboardSource::AttackedEndpoints => format!(
                "/security/attacked-endpoints?page={}&page_size={}",
                page, page_size
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardSource::TrafficAnalysis => "traffic_analysis",
            DashboardSource::ThreatScores => "threat_scores",
            DashboardSource::ThreatIndicators => "threat_indicators",
            DashboardSource::ThreatTrends => "threat_trends",
            DashboardSource::AttackedEndpoints => "attacked_endpoints",
        }
    }
}

impl fmt::Display for DashboardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            DashboardSource::ThreatScores.path(1, 10),
            "/security/threat-score"
        );
        assert_eq!(
            DashboardSource::AttackedEndpoints.path(3, 25),
            "/security/attacked-endpoints?page=3&page_size=25"
        );
    }

    #[test]
    fn test_serialized_name_matches_display() {
        for source in DashboardSource::ALL {
            assert_eq!(
                serde_json::to_value(source).unwrap(),
                serde_json::Value::String(source.to_string())
            );
        }
    }
}
