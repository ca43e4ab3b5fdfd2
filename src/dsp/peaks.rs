#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakOptions {
    /// 最低峰值高度（含）
    pub height: Option<f64>,
    /// 相鄰峰值的最小間距（樣本數）
    pub distance: Option<usize>,
}

/// Local maxima, filtered by height and then thinned by distance.
///
/// Flat tops report their middle sample (rounded down); the first and last
/// samples are never peaks. When thinning, taller peaks win and any lower
/// peak closer than `distance` samples is dropped. The result is sorted.
pub fn find_peaks(x: &[f64], options: &PeakOptions) -> Vec<usize> {
    let mut peaks = local_maxima(x);

    if let Some(height) = options.height {
        peaks.retain(|&p| x[p] >= height);
    }

    if let Some(distance) = options.distance {
        if distance > 1 && peaks.len() > 1 {
            peaks = select_by_distance(x, &peaks, distance);
        }
    }

    peaks
}

fn local_maxima(x: &[f64]) -> Vec<usize> {
    let n = x.len();
    let mut peaks = Vec::new();
    let mut i = 1;

    while i + 1 < n {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead + 1 < n && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}

fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];

    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &i in order.iter().rev() {
        if !keep[i] {
            continue;
        }

        let mut k = i;
        while k > 0 && peaks[i] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }

        let mut k = i + 1;
        while k < peaks.len() && peaks[k] - peaks[i] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_maxima() {
        let x = [0.0, 1.0, 0.0, 2.0, 0.0, 0.5, 0.0];
        assert_eq!(find_peaks(&x, &PeakOptions::default()), vec![1, 3, 5]);
    }

    #[test]
    fn test_edges_are_not_peaks() {
        let x = [3.0, 1.0, 2.0, 1.0, 4.0];
        assert_eq!(find_peaks(&x, &PeakOptions::default()), vec![2]);
    }

    #[test]
    fn test_plateau_reports_middle() {
        let x = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&x, &PeakOptions::default()), vec![2]);

        // 以上升結束的平台不算峰值
        let rising = [0.0, 1.0, 1.0, 2.0];
        assert!(find_peaks(&rising, &PeakOptions::default()).is_empty());
    }

    #[test]
    fn test_height_is_inclusive() {
        let x = [0.0, 1.0, 0.0, 2.0, 0.0, 0.5, 0.0];
        let options = PeakOptions {
            height: Some(1.0),
            distance: None,
        };
        assert_eq!(find_peaks(&x, &options), vec![1, 3]);
    }

    #[test]
    fn test_distance_keeps_tallest() {
        let x = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.5, 0.0];
        let options = PeakOptions {
            height: None,
            distance: Some(3),
        };
        // 3 勝過 1 與 5；9 與 3 相距 6
        assert_eq!(find_peaks(&x, &options), vec![3, 9]);
    }

    #[test]
    fn test_distance_of_one_keeps_everything() {
        let x = [0.0, 1.0, 0.0, 1.0, 0.0];
        let options = PeakOptions {
            height: None,
            distance: Some(1),
        };
        assert_eq!(find_peaks(&x, &options), vec![1, 3]);
    }

    #[test]
    fn test_short_inputs() {
        assert!(find_peaks(&[], &PeakOptions::default()).is_empty());
        assert!(find_peaks(&[1.0, 2.0], &PeakOptions::default()).is_empty());
    }
}
