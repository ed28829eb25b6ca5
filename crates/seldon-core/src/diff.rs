//! 제공자 → 로컬 단방향 차집합.
//!
//! 제공자(upstream)에는 있고 로컬에는 없는 레코드만 골라냅니다.
//! 로컬에만 있는 키는 무시하며(삭제/표시하지 않음), 양쪽에 모두 있는 키는
//! 필드 값이 달라도 이미 동기화된 것으로 봅니다.
//!
//! ```
//! use seldon_core::missing_upstream;
//!
//! let upstream = vec!["A", "B", "C"];
//! let local = vec!["B", "C", "D"];
//! let missing = missing_upstream(upstream, local, |code| *code);
//! assert_eq!(missing, vec!["A"]);
//! ```

use std::collections::HashSet;
use std::hash::Hash;

/// 로컬 키 집합에 없는 upstream 레코드를 반환합니다.
///
/// O(n) 해시 집합 차집합이며 upstream 순서를 유지합니다.
/// upstream 안에서 같은 키가 반복되면 첫 번째 레코드만 남깁니다.
pub fn missing_upstream<T, K, L, F>(upstream: Vec<T>, local_keys: L, key: F) -> Vec<T>
where
    K: Eq + Hash,
    L: IntoIterator<Item = K>,
    F: Fn(&T) -> K,
{
    let mut seen: HashSet<K> = local_keys.into_iter().collect();

    upstream
        .into_iter()
        .filter(|record| seen.insert(key(record)))
        .collect()
}
