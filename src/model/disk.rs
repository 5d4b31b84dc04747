use bytesize::ByteSize;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct DiskSpace {
    pub total: u64,
    pub used: u64,
    #[serde(default)]
    pub free: u64,
}

impl DiskSpace {
    pub fn used_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.used as f64 / self.total as f64).clamp(0.0, 1.0)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} / {} ({:.0}%)",
            ByteSize(self.used),
            ByteSize(self.total),
            self.used_ratio() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_handles_zero_and_overflowing_usage() {
        assert_eq!(DiskSpace::default().used_ratio(), 0.0);
        let over = DiskSpace { total: 10, used: 20, free: 0 };
        assert_eq!(over.used_ratio(), 1.0);
        let half = DiskSpace { total: 100, used: 50, free: 50 };
        assert!((half.used_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
