/// `num_values` evenly spaced points from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, num_values: usize) -> Vec<f64> {
    if num_values < 2 {
        return vec![start; num_values];
    }
    let mut values = Vec::with_capacity(num_values);
    let intervals = num_values as f64 - 1.0;

    for i in 0..num_values {
        let value = start + (end - start) * (i as f64) / intervals;
        values.push(value);
    }

    values
}

/// `num_values` evenly spaced points strictly between `start` and `end`
pub fn interior_points(start: f64, end: f64, num_values: usize) -> Vec<f64> {
    let mut grid = linspace(start, end, num_values + 2);
    grid.pop();
    if !grid.is_empty() {
        grid.remove(0);
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace() {
        let grid = linspace(0.0, 1.0, 5);
        assert_eq!(grid, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        let inner = interior_points(0.0, 1.0, 3);
        assert_eq!(inner, vec![0.25, 0.5, 0.75]);
        assert!(interior_points(-1.0, 1.0, 257).contains(&0.0));
    }
}
