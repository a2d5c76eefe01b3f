//! Lazy enumerators for the two point sets the probes walk: the corners of
//! an N-dimensional hyperrectangle, and the lattice points of a 2D lattice
//! inside a plane rectangle.

use glam::{DMat2, DVec2};

/// Emits the 2^N vertices of an axis-aligned hyperrectangle.
///
/// Corner `b` is the vector whose i-th entry is `x0[i]`, plus `dims[i]` when
/// bit i of `b` is set. Vertices are written into a caller-owned buffer so
/// enumeration allocates nothing; the counter fits in a `u64`, which is why
/// N must stay below the machine integer width.
pub struct RectangleVertices<'a> {
    x0: &'a [f64],
    dims: &'a [f64],
    upper: u64,
    bitvector: u64,
}

impl<'a> RectangleVertices<'a> {
    pub fn new(x0: &'a [f64], dims: &'a [f64]) -> Self {
        debug_assert_eq!(x0.len(), dims.len());
        debug_assert!(x0.len() < u64::BITS as usize);
        Self {
            x0,
            dims,
            upper: 1u64 << x0.len(),
            bitvector: 0,
        }
    }

    /// Write the next vertex into `out`. Returns false once all 2^N corners
    /// have been emitted.
    pub fn next_vertex(&mut self, out: &mut [f64]) -> bool {
        if self.bitvector >= self.upper {
            return false;
        }

        for (bit, slot) in out.iter_mut().enumerate() {
            *slot = self.x0[bit];
            if self.bitvector & (1u64 << bit) != 0 {
                *slot += self.dims[bit];
            }
        }

        self.bitvector += 1;
        true
    }

    pub fn restart(&mut self) {
        self.bitvector = 0;
    }
}

/// Emits every lattice point inside an axis-aligned plane rectangle.
///
/// The rectangle's corners are mapped through the inverse basis to get an
/// integer bounding box in lattice coordinates; each integer pair in the box
/// is mapped back through the basis and kept only if it lands inside the
/// rectangle. The filter is required because the lattice-coordinate box
/// strictly contains the rectangle whenever the basis is skewed.
pub struct LatticePoints {
    basis: DMat2,
    x0: f64,
    y0: f64,
    width: f64,
    height: f64,

    imin: f64,
    imax: f64,
    jmin: f64,
    jmax: f64,
    i: f64,
    j: f64,
}

impl LatticePoints {
    pub fn new(
        basis: DMat2,
        inverse_basis: DMat2,
        x0: f64,
        y0: f64,
        width: f64,
        height: f64,
    ) -> Self {
        let mut min = DVec2::splat(f64::MAX);
        let mut max = DVec2::splat(f64::MIN);
        for corner in [
            DVec2::new(x0, y0),
            DVec2::new(x0 + width, y0),
            DVec2::new(x0, y0 + height),
            DVec2::new(x0 + width, y0 + height),
        ] {
            let q = inverse_basis * corner;
            min = min.min(q);
            max = max.max(q);
        }

        let imin = min.x.ceil();
        let imax = max.x.floor();
        let jmin = min.y.ceil();
        let jmax = max.y.floor();

        Self {
            basis,
            x0,
            y0,
            width,
            height,
            imin,
            imax,
            jmin,
            jmax,
            i: imin,
            j: jmin,
        }
    }

    pub fn restart(&mut self) {
        self.i = self.imin;
        self.j = self.jmin;
    }
}

impl Iterator for LatticePoints {
    type Item = DVec2;

    fn next(&mut self) -> Option<DVec2> {
        while self.i <= self.imax {
            while self.j <= self.jmax {
                let p = self.basis * DVec2::new(self.i, self.j);
                self.j += 1.0;

                if p.x >= self.x0
                    && p.x <= self.x0 + self.width
                    && p.y >= self.y0
                    && p.y <= self.y0 + self.height
                {
                    return Some(p);
                }
            }
            self.i += 1.0;
            self.j = self.jmin;
        }
        None
    }
}
