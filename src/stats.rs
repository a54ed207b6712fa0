use crate::ConversionResult;

/// Running totals for one batch.
///
/// Owned by the loop that processes the batch, so plain counters suffice.
#[derive(Debug, Default)]
pub struct ConversionStats {
    success_count: usize,
    fail_count: usize,
    errors: Vec<String>,
    space_saved: i64,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a converted file. `output_size` is `None` when the output could
    /// not be found afterwards, in which case no space is credited.
    pub fn record_success(&mut self, original_size: u64, output_size: Option<u64>) {
        self.success_count += 1;
        if let Some(output_size) = output_size {
            self.space_saved += original_size as i64 - output_size as i64;
        }
    }

    pub fn record_error(&mut self, file_name: &str, error: &str) {
        self.fail_count += 1;
        self.errors.push(format!("{file_name}: {error}"));
    }

    pub fn processed(&self) -> usize {
        self.success_count + self.fail_count
    }

    pub fn into_result(self) -> ConversionResult {
        ConversionResult {
            success_count: self.success_count,
            fail_count: self.fail_count,
            errors: self.errors,
            space_saved: self.space_saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_can_go_negative() {
        let mut stats = ConversionStats::new();
        stats.record_success(1000, Some(400));
        stats.record_success(100, Some(250));

        let result = stats.into_result();
        assert_eq!(result.success_count, 2);
        assert_eq!(result.space_saved, 600 - 150);
    }

    #[test]
    fn missing_output_counts_success_without_savings() {
        let mut stats = ConversionStats::new();
        stats.record_success(1000, None);

        let result = stats.into_result();
        assert_eq!(result.success_count, 1);
        assert_eq!(result.space_saved, 0);
    }

    #[test]
    fn errors_keep_processing_order() {
        let mut stats = ConversionStats::new();
        stats.record_error("b.png", "cannot decode image");
        stats.record_success(10, Some(5));
        stats.record_error("a.jpg", "unexpected fault: boom");

        assert_eq!(stats.processed(), 3);
        let result = stats.into_result();
        assert_eq!(result.fail_count, 2);
        assert_eq!(
            result.errors,
            vec![
                "b.png: cannot decode image".to_string(),
                "a.jpg: unexpected fault: boom".to_string(),
            ]
        );
    }
}
