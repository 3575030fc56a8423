use crate::classify::PageType;
use crate::store::{PageResult, UrlTask};

/// Per-category pass threshold for the B2 compliance bar.
const PASS_THRESHOLD: f64 = 70.0;

pub struct Summary {
    pub overall: f64,
    pub total: usize,
    pub per_type: Vec<TypeSummary>,
}

pub struct TypeSummary {
    pub page_type: PageType,
    pub mean: f64,
    pub count: usize,
}

/// Unweighted means over the result set; any business weighting belongs to
/// the dashboard. Returns `None` for an empty run instead of failing.
pub fn summarize(results: &[PageResult]) -> Option<Summary> {
    if results.is_empty() {
        return None;
    }

    let overall = mean(results.iter().map(|r| r.compliance_level));

    let per_type = PageType::ALL
        .iter()
        .filter_map(|&pt| {
            let of_type: Vec<_> = results.iter().filter(|r| r.page_type == pt).collect();
            if of_type.is_empty() {
                return None;
            }
            Some(TypeSummary {
                page_type: pt,
                mean: mean(of_type.iter().map(|r| r.compliance_level)),
                count: of_type.len(),
            })
        })
        .collect();

    Some(Summary {
        overall,
        total: results.len(),
        per_type,
    })
}

fn mean(levels: impl Iterator<Item = i64>) -> f64 {
    let (sum, count) = levels.fold((0i64, 0usize), |(s, c), v| (s + v, c + 1));
    sum as f64 / count as f64
}

pub fn print_summary(summary: &Summary) {
    println!(
        "\nOverall CEFR B2 accessibility score: {:.2}% ({} pages)",
        summary.overall, summary.total
    );
    for t in &summary.per_type {
        let marker = if t.mean >= PASS_THRESHOLD { "OK" } else { "!!" };
        println!(
            "{} {:<8} {:>6.2}% average compliance ({} pages)",
            marker, t.page_type, t.mean, t.count
        );
    }
}

/// Page-type distribution of the input list, shown before crawling starts.
pub fn print_distribution(tasks: &[UrlTask]) {
    println!("URL distribution:");
    for pt in PageType::ALL {
        let count = tasks.iter().filter(|t| t.page_type == pt).count();
        if count > 0 {
            println!("  {:<8} {}", pt, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, pt: PageType, level: i64) -> PageResult {
        PageResult {
            url: url.to_string(),
            page_type: pt,
            compliance_level: level,
            vocabulary_complexity: 0,
            grammatical_structures: 0,
            overall_clarity: 0,
            coherence: 0,
            rationale: String::new(),
            error: None,
        }
    }

    #[test]
    fn per_category_mean() {
        let results = vec![
            result("a", PageType::Product, 90),
            result("b", PageType::Product, 50),
            result("c", PageType::Product, 70),
        ];
        let summary = summarize(&results).unwrap();
        assert_eq!(summary.per_type.len(), 1);
        assert_eq!(summary.per_type[0].mean, 70.0);
        assert_eq!(summary.per_type[0].count, 3);
    }

    #[test]
    fn overall_is_unweighted_across_categories() {
        let results = vec![
            result("a", PageType::Product, 80),
            result("b", PageType::Product, 60),
            result("c", PageType::Faq, 40),
        ];
        let summary = summarize(&results).unwrap();
        assert_eq!(summary.overall, 60.0);
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn empty_input_is_undefined_not_fatal() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn categories_in_fixed_order() {
        let results = vec![
            result("a", PageType::Blog, 10),
            result("b", PageType::Product, 20),
            result("c", PageType::Legal, 30),
        ];
        let summary = summarize(&results).unwrap();
        let order: Vec<PageType> = summary.per_type.iter().map(|t| t.page_type).collect();
        assert_eq!(order, vec![PageType::Product, PageType::Legal, PageType::Blog]);
    }
}
