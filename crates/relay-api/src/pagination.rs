//! Query-parameter extraction shared by the paginated endpoints. Bad
//! values coerce instead of erroring, matching the long-deployed endpoint
//! behaviour clients already rely on.

use tracing::debug;

const PAGE_DEFAULT: &str = "1";
const PER_PAGE_DEFAULT: &str = "20";

fn last_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
	pairs
		.iter()
		.rev()
		.find(|(name, _)| name == key)
		.map(|(_, value)| value.as_str())
}

fn coerce(raw: &str, key: &str) -> u64 {
	match raw.parse::<u64>() {
		Ok(value) if value > 0 => value,
		_ => {
			debug!(%key, %raw, "unusable pagination value, coercing to 1");
			1
		}
	}
}

/// `(page, perPage)` from parsed query pairs. Absent values take the
/// defaults; anything unparseable or non-positive coerces to 1. The
/// asymmetry between the per-page default of 20 and the coercion target of
/// 1 is deliberate legacy behaviour.
pub fn extract_pagination(pairs: &[(String, String)]) -> (u64, u64) {
	let page = coerce(last_value(pairs, "page").unwrap_or(PAGE_DEFAULT), "page");
	let per_page = coerce(
		last_value(pairs, "perPage").unwrap_or(PER_PAGE_DEFAULT),
		"perPage",
	);
	(page, per_page)
}

/// The `networkId` parameter, defaulting to 1 whenever missing or
/// unparseable.
pub fn extract_network_id(pairs: &[(String, String)]) -> u64 {
	last_value(pairs, "networkId")
		.and_then(|raw| raw.parse().ok())
		.unwrap_or(1)
}

/// Parses a raw query string into pairs.
pub fn query_pairs(query: &str) -> Vec<(String, String)> {
	form_urlencoded::parse(query.as_bytes())
		.into_owned()
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pairs(query: &str) -> Vec<(String, String)> {
		query_pairs(query)
	}

	#[test]
	fn defaults_apply_when_absent() {
		assert_eq!(extract_pagination(&pairs("")), (1, 20));
	}

	#[test]
	fn explicit_values_pass_through() {
		assert_eq!(extract_pagination(&pairs("page=3&perPage=50")), (3, 50));
	}

	#[test]
	fn malformed_values_coerce_to_one() {
		assert_eq!(extract_pagination(&pairs("page=abc&perPage=xyz")), (1, 1));
		assert_eq!(extract_pagination(&pairs("page=0&perPage=0")), (1, 1));
		assert_eq!(extract_pagination(&pairs("page=-2&perPage=-9")), (1, 1));
	}

	#[test]
	fn results_are_always_positive() {
		for query in ["", "page=0", "page=huge&perPage=", "perPage=18446744073709551616"] {
			let (page, per_page) = extract_pagination(&pairs(query));
			assert!(page >= 1, "query {query:?}");
			assert!(per_page >= 1, "query {query:?}");
		}
	}

	#[test]
	fn network_id_defaults_to_one() {
		assert_eq!(extract_network_id(&pairs("")), 1);
		assert_eq!(extract_network_id(&pairs("networkId=banana")), 1);
		assert_eq!(extract_network_id(&pairs("networkId=42")), 42);
	}
}
