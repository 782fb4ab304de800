use super::accumulator::TrackPoint;

/// Thin a segment for rendering: drop near-duplicate neighbors within
/// `min_delta` degrees, then decimate to at most `max_points` by uniform
/// stride. The first and last point always survive.
pub fn simplify_segment(points: &[TrackPoint], min_delta: f64, max_points: usize) -> Vec<TrackPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut kept: Vec<TrackPoint> = Vec::with_capacity(points.len());
    kept.push(points[0]);
    for point in &points[1..points.len() - 1] {
        let last = kept[kept.len() - 1];
        if (point.lat - last.lat).abs() >= min_delta || (point.lon - last.lon).abs() >= min_delta {
            kept.push(*point);
        }
    }
    kept.push(points[points.len() - 1]);

    if max_points < 2 || kept.len() <= max_points {
        return kept;
    }

    let stride = (kept.len() as f64 / max_points as f64).ceil() as usize;
    let last = kept[kept.len() - 1];
    let mut out: Vec<TrackPoint> = kept
        .iter()
        .copied()
        .enumerate()
        .filter_map(|(i, p)| if i % stride == 0 { Some(p) } else { None })
        .collect();
    if out.last() != Some(&last) {
        if out.len() >= max_points {
            let end = out.len() - 1;
            out[end] = last;
        } else {
            out.push(last);
        }
    }
    out
}
