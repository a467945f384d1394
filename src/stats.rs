use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{BranchStats, Offer, OfferStatus, Stats, Student, TopCompany};

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `part` in `whole`; `None` when `whole` is 0.
pub fn rate(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| round2(part as f64 / whole as f64 * 100.0))
}

pub fn mean(sum: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| round2(sum / count as f64))
}

/// The student's best accepted package, or `None` if nothing was accepted.
pub fn best_accepted_package(student_id: &str, offers: &[Offer]) -> Option<f64> {
    offers
        .iter()
        .filter(|offer| offer.student_id == student_id && offer.status == OfferStatus::Accepted)
        .map(|offer| offer.package)
        .fold(None, |best, package| Some(best.unwrap_or(0.0).max(package)))
}

/// Running placement figures for one group of students (a branch or a batch).
#[derive(Debug, Default, Clone)]
pub struct PlacementTally {
    pub total_students: usize,
    pub placed: usize,
    package_sum: f64,
    highest: Option<f64>,
    lowest: Option<f64>,
}

impl PlacementTally {
    pub fn record(&mut self, best_accepted: Option<f64>) {
        self.total_students += 1;
        let Some(package) = best_accepted else {
            return;
        };

        self.placed += 1;
        self.package_sum += package;
        self.highest = Some(self.highest.map_or(package, |value| value.max(package)));
        self.lowest = Some(self.lowest.map_or(package, |value| value.min(package)));
    }

    pub fn placement_rate(&self) -> Option<f64> {
        rate(self.placed, self.total_students)
    }

    pub fn avg_package(&self) -> Option<f64> {
        mean(self.package_sum, self.placed)
    }

    pub fn highest_package(&self) -> f64 {
        self.highest.unwrap_or(0.0)
    }

    pub fn lowest_package(&self) -> f64 {
        self.lowest.unwrap_or(0.0)
    }
}

pub fn compute_stats(students: &[Student], offers: &[Offer]) -> Stats {
    let total_students = students.len();
    let known: HashSet<&str> = students.iter().map(|student| student.id.as_str()).collect();
    let placed_students = offers
        .iter()
        .filter(|offer| offer.status == OfferStatus::Accepted)
        .map(|offer| offer.student_id.as_str())
        .filter(|id| known.contains(id))
        .collect::<HashSet<_>>()
        .len();

    let accepted: Vec<f64> = offers
        .iter()
        .filter(|offer| offer.status == OfferStatus::Accepted)
        .map(|offer| offer.package)
        .collect();
    let avg_package = mean(accepted.iter().sum(), accepted.len());

    let highest_package = offers
        .iter()
        .map(|offer| offer.package)
        .fold(None, |max: Option<f64>, package| {
            Some(max.map_or(package, |value| value.max(package)))
        })
        .unwrap_or(0.0);

    let stats = Stats {
        total_students,
        placed_students,
        placement_rate: rate(placed_students, total_students),
        avg_package,
        top_company: top_company(offers),
        highest_package,
        branch_stats: branch_stats(students, offers),
    };

    debug!(
        total_students,
        placed_students,
        accepted_offers = accepted.len(),
        "computed placement stats"
    );
    stats
}

/// Company with the most offers of any status; the first one seen wins ties.
fn top_company(offers: &[Offer]) -> TopCompany {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for offer in offers {
        match counts.iter_mut().find(|entry| entry.0 == offer.company_name) {
            Some(entry) => entry.1 += 1,
            None => counts.push((offer.company_name.as_str(), 1)),
        }
    }

    let mut top = TopCompany {
        name: "None".to_string(),
        count: 0,
    };
    for (name, count) in counts {
        if count > top.count {
            top = TopCompany {
                name: name.to_string(),
                count,
            };
        }
    }
    top
}

fn branch_stats(students: &[Student], offers: &[Offer]) -> Vec<BranchStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, PlacementTally> = HashMap::new();

    for student in students {
        let tally = tallies.entry(student.branch.as_str()).or_insert_with(|| {
            order.push(student.branch.as_str());
            PlacementTally::default()
        });
        tally.record(best_accepted_package(&student.id, offers));
    }

    order
        .into_iter()
        .filter_map(|branch| {
            tallies.get(branch).map(|tally| BranchStats {
                branch: branch.to_string(),
                total_students: tally.total_students,
                placed_students: tally.placed,
                placement_rate: tally.placement_rate(),
                avg_package: tally.avg_package(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, branch: &str) -> Student {
        Student {
            id: id.to_string(),
            name: format!("Student {id}"),
            branch: branch.to_string(),
            batch: "2020-2024".to_string(),
            ..Student::default()
        }
    }

    fn offer(student_id: &str, company: &str, package: f64, status: OfferStatus) -> Offer {
        Offer {
            id: format!("{student_id}-{company}"),
            student_id: student_id.to_string(),
            company_name: company.to_string(),
            role: "Engineer".to_string(),
            package,
            status,
            ..Offer::default()
        }
    }

    #[test]
    fn single_accepted_offer_places_everyone() {
        let students = vec![student("1", "CS")];
        let offers = vec![offer("1", "TCS", 7.5, OfferStatus::Accepted)];

        let stats = compute_stats(&students, &offers);
        assert_eq!(stats.total_students, 1);
        assert_eq!(stats.placed_students, 1);
        assert_eq!(stats.placement_rate, Some(100.0));
        assert_eq!(stats.avg_package, Some(7.5));

        let json = serde_json::to_value(&stats).expect("stats serialize");
        assert_eq!(json["placementRate"], "100.00");
        assert_eq!(json["avgPackage"], "7.50");
    }

    #[test]
    fn empty_inputs_yield_zeroes() {
        let stats = compute_stats(&[], &[]);
        assert_eq!(stats.placement_rate, None);
        assert_eq!(stats.avg_package, None);
        assert_eq!(stats.highest_package, 0.0);
        assert_eq!(stats.top_company.name, "None");
        assert_eq!(stats.top_company.count, 0);
        assert!(stats.branch_stats.is_empty());

        let json = serde_json::to_value(&stats).expect("stats serialize");
        assert_eq!(json["placementRate"], 0);
        assert_eq!(json["avgPackage"], 0);
    }

    #[test]
    fn avg_package_is_zero_without_accepted_offers() {
        let students = vec![student("1", "CS")];
        let offers = vec![offer("1", "TCS", 9.0, OfferStatus::Pending)];
        let stats = compute_stats(&students, &offers);
        assert_eq!(stats.avg_package, None);
        assert_eq!(stats.placement_rate, Some(0.0));
        assert_eq!(stats.highest_package, 9.0);

        let json = serde_json::to_value(&stats).expect("stats serialize");
        assert_eq!(json["placementRate"], "0.00");
        assert_eq!(json["avgPackage"], 0);
    }

    #[test]
    fn placed_students_are_counted_once() {
        let students = vec![student("1", "CS"), student("2", "CS")];
        let offers = vec![
            offer("1", "TCS", 6.0, OfferStatus::Accepted),
            offer("1", "Infosys", 8.0, OfferStatus::Accepted),
        ];

        let stats = compute_stats(&students, &offers);
        assert_eq!(stats.placed_students, 1);
        assert_eq!(stats.placement_rate, Some(50.0));
        // Every accepted offer contributes to the global average.
        assert_eq!(stats.avg_package, Some(7.0));
        // The branch average uses each student's best offer instead.
        assert_eq!(stats.branch_stats[0].avg_package, Some(8.0));
        assert_eq!(stats.branch_stats[0].placed_students, 1);
    }

    #[test]
    fn top_company_ties_go_to_first_seen() {
        let offers = vec![
            offer("1", "Wipro", 5.0, OfferStatus::Declined),
            offer("2", "TCS", 5.0, OfferStatus::Pending),
            offer("3", "TCS", 5.0, OfferStatus::Pending),
            offer("4", "Wipro", 5.0, OfferStatus::Accepted),
        ];
        let stats = compute_stats(&[], &offers);
        assert_eq!(stats.top_company.name, "Wipro");
        assert_eq!(stats.top_company.count, 2);
    }

    #[test]
    fn branch_stats_follow_first_seen_order() {
        let students = vec![student("1", "EC"), student("2", "CS"), student("3", "EC")];
        let offers = vec![offer("3", "TCS", 4.0, OfferStatus::Accepted)];
        let stats = compute_stats(&students, &offers);
        let branches: Vec<&str> = stats
            .branch_stats
            .iter()
            .map(|entry| entry.branch.as_str())
            .collect();
        assert_eq!(branches, vec!["EC", "CS"]);
        assert_eq!(stats.branch_stats[0].placement_rate, Some(50.0));
        assert_eq!(stats.branch_stats[1].placement_rate, Some(0.0));
        assert_eq!(stats.branch_stats[1].avg_package, None);
    }

    #[test]
    fn orphaned_offers_do_not_inflate_the_rate() {
        let students = vec![student("1", "CS")];
        let offers = vec![
            offer("1", "TCS", 5.0, OfferStatus::Accepted),
            offer("ghost", "TCS", 5.0, OfferStatus::Accepted),
        ];
        let stats = compute_stats(&students, &offers);
        assert_eq!(stats.placement_rate, Some(100.0));
    }

    #[test]
    fn tally_without_placements_reports_zero_extremes() {
        let mut tally = PlacementTally::default();
        tally.record(None);
        assert_eq!(tally.lowest_package(), 0.0);
        assert_eq!(tally.highest_package(), 0.0);
        assert_eq!(tally.avg_package(), None);
        assert_eq!(tally.placement_rate(), Some(0.0));
        assert_eq!(PlacementTally::default().placement_rate(), None);
    }

    #[test]
    fn round2_rounds_half_up() {
        assert_eq!(round2(66.666), 66.67);
        assert_eq!(rate(1, 3), Some(33.33));
    }
}
