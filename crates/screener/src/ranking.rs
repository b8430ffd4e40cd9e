use common::AnalysisResult;

/// Passing candidates ordered closest-to-EMA first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedResults {
    results: Vec<AnalysisResult>,
}

impl RankedResults {
    /// The first `n` candidates, for console previews.
    pub fn top(&self, n: usize) -> &[AnalysisResult] {
        &self.results[..n.min(self.results.len())]
    }

    pub fn as_slice(&self) -> &[AnalysisResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_vec(self) -> Vec<AnalysisResult> {
        self.results
    }
}

/// Keep `PASS` results and sort them by ascending `distance_percent`,
/// breaking ties by symbol.
///
/// Call once every instrument has been evaluated; ranking is not incremental.
pub fn rank(results: &[AnalysisResult]) -> RankedResults {
    let mut passed: Vec<AnalysisResult> = results.iter().filter(|r| r.passed()).cloned().collect();
    passed.sort_by(|a, b| {
        let da = a.distance_percent.unwrap_or(f64::INFINITY);
        let db = b.distance_percent.unwrap_or(f64::INFINITY);
        da.total_cmp(&db).then_with(|| a.symbol.cmp(&b.symbol))
    });
    RankedResults { results: passed }
}
