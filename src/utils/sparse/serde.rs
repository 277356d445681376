use num::Num;
use serde::{ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer};

use super::CscMatrix;

/// Coordinate list view used on the wire: `[[row, col, value], ...]`
struct Entries<'a, N: Num + Copy>(&'a CscMatrix<N>);

impl<N> Serialize for Entries<'_, N>
where
    N: Num + Copy + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.raw_iter())
    }
}

impl<N> Serialize for CscMatrix<N>
where
    N: Num + Copy + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("CscMatrix", 2)?;
        state.serialize_field("dim", &self.dim)?;
        state.serialize_field("entries", &Entries(self))?;
        state.end()
    }
}

impl<'de, N> Deserialize<'de> for CscMatrix<N>
where
    N: Num + Copy + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(bound = "M: Deserialize<'de>")]
        struct Repr<M> {
            dim: usize,
            entries: Vec<(u32, u32, M)>,
        }

        let repr: Repr<N> = Repr::deserialize(deserializer)?;
        // 重複座標は加算、範囲外はエラー
        CscMatrix::from_triplets(repr.dim, repr.entries).map_err(serde::de::Error::custom)
    }
}
