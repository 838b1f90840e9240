//! 數列統計工具。所有函式對空輸入回傳 None 或 0，不會產生 NaN。

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// 母體標準差
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let mut min = values[0];
    let mut max = values[0];
    for &v in &values[1..] {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    Some((min, max))
}

pub fn percent_change(old: f64, new: f64) -> Option<f64> {
    if old == 0.0 {
        return None;
    }
    Some((new - old) / old * 100.0)
}

/// 簡單移動平均；window 為 0 或大於長度時回傳空
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || window > values.len() {
        return Vec::new();
    }

    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// 最小平方法趨勢斜率，x 軸為索引 0..n
pub fn trend_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n_f;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// 互動率 = (讚 + 留言 + 分享) / 追蹤者；沒有追蹤者時為 0.0
pub fn engagement_rate(likes: u64, comments: u64, shares: u64, followers: u64) -> f64 {
    if followers == 0 {
        return 0.0;
    }
    (likes + comments + shares) as f64 / followers as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_median() {
        let values = [2.0, 4.0, 6.0, 8.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(median(&values), Some(5.0));
        assert_eq!(median(&[1.0, 2.0, 10.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        // 母體標準差 of [2, 4, 4, 4, 5, 5, 7, 9] = 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = std_dev(&values).unwrap();
        assert!((sd - 2.0).abs() < 1e-9);
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[3.0, 1.0, 2.0]), Some((1.0, 3.0)));
        assert_eq!(min_max(&[5.0]), Some((5.0, 5.0)));
        assert_eq!(min_max(&[]), None);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(100.0, 150.0), Some(50.0));
        assert_eq!(percent_change(200.0, 100.0), Some(-50.0));
        assert_eq!(percent_change(0.0, 100.0), None);
    }

    #[test]
    fn test_moving_average() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(moving_average(&values, 3), vec![2.0, 3.0, 4.0]);
        assert!(moving_average(&values, 0).is_empty());
        assert!(moving_average(&values, 6).is_empty());
    }

    #[test]
    fn test_trend_slope() {
        // 完全線性：y = 2x + 1
        let values = [1.0, 3.0, 5.0, 7.0];
        let slope = trend_slope(&values).unwrap();
        assert!((slope - 2.0).abs() < 1e-9);

        // 水平線斜率為 0
        let flat = [4.0, 4.0, 4.0];
        assert!(trend_slope(&flat).unwrap().abs() < 1e-9);

        assert_eq!(trend_slope(&[1.0]), None);
        assert_eq!(trend_slope(&[]), None);
    }

    #[test]
    fn test_engagement_rate() {
        assert!((engagement_rate(80, 15, 5, 1000) - 0.1).abs() < 1e-9);
        assert_eq!(engagement_rate(10, 5, 5, 0), 0.0); // 不產生 NaN
    }
}
