pub const ILLUMINANT_D65: [f32; 2] = [0.3127, 0.3290];
pub const ILLUMINANT_E: [f32; 2] = [1.0 / 3.0, 1.0 / 3.0];
pub const ILLUMINANT_DCI: [f32; 2] = [0.3140, 0.3510];

pub const PRIMARIES_SRGB: [[f32; 2]; 3] = [[0.639998, 0.330010], [0.300003, 0.600003], [0.150002, 0.059997]];
pub const PRIMARIES_BT2100: [[f32; 2]; 3] = [[0.708, 0.292], [0.170, 0.797], [0.131, 0.046]];
pub const PRIMARIES_P3: [[f32; 2]; 3] = [[0.680, 0.320], [0.265, 0.690], [0.150, 0.060]];

/// RGB -> XYB opsin absorbance matrix, as published by the specification.
pub const OPSIN_ABSORBANCE_MATRIX: [[f32; 3]; 3] = [
    [0.300_000_011_920_928_955, 0.622_000_038_623_809_814, 0.078_000_001_609_325_409],
    [0.230_000_004_172_325_134, 0.692_000_031_471_252_441, 0.077_999_997_138_977_051],
    [0.243_422_699_999_999_990, 0.204_586_199_999_999_990, 0.551_991_099_999_999_950],
];

pub const OPSIN_BIAS: [f32; 3] = [0.003_793_073_411_430_954, 0.003_793_073_411_430_954, 0.003_793_073_411_430_954];

pub const OPSIN_BIAS_CBRT: [f32; 3] = [0.155_954_200_000_000_010, 0.155_954_200_000_000_010, 0.155_954_200_000_000_010];
