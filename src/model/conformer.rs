/// One 3D coordinate assignment for every atom of a fixed molecular topology.
///
/// A conformer is a pure geometric overlay: it carries one `[x, y, z]` triple
/// per atom of the owning [`Molecule`](super::molecule::Molecule), in the same
/// atom order, plus optional scalar metadata attached by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformer {
    /// `coords[i]` is `[x, y, z]` for atom `i` in Ångströms.
    pub coords: Vec<[f64; 3]>,
    /// RMSD against the ensemble reference, set by the ranking stage.
    pub rmsd: Option<f64>,
    /// Final force-field energy in kcal/mol, set by the optimization stage.
    pub energy: Option<f64>,
}

impl Conformer {
    pub fn new(coords: Vec<[f64; 3]>) -> Self {
        Self {
            coords,
            rmsd: None,
            energy: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Euclidean distance between atoms `i` and `j`.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        let a = self.coords[i];
        let b = self.coords[j];
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        let dz = a[2] - b[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Geometric centroid over all atoms.
    pub fn centroid(&self) -> [f64; 3] {
        if self.coords.is_empty() {
            return [0.0; 3];
        }
        let n = self.coords.len() as f64;
        let mut c = [0.0; 3];
        for p in &self.coords {
            c[0] += p[0];
            c[1] += p[1];
            c[2] += p[2];
        }
        [c[0] / n, c[1] / n, c[2] / n]
    }
}
