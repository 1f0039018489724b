// Format of pixel is defined by one u32, using bit fields as follows
//
//                               2                1          0
//                          3 2 10987 6 5 4 3 2 1 098 7654 321
//                          A O TTTTT U Y F P X S EEE CCCC BBB
//
//            A: Floating point -- With this flag we can differentiate 16 bits as float and as int
//            O: Optimized -- previous optimization already returns the final 8-bit value
//            T: Pixeltype
//            F: Flavor  0=MinIsBlack(Chocolate) 1=MinIsWhite(Vanilla)
//            P: Planar? 0=Chunky, 1=Planar
//            X: swap 16 bps endianness?
//            S: Do swap? ie, BGR, KYMC
//            E: Extra samples
//            C: Channels (Samples per pixel)
//            B: bytes per sample
//            Y: Swap first - changes ABGR to BGRA and KCMY to CMYK
//
// Only the fields the optimizer looks at have macros here.

macro_rules! float_sh {
    ($a:expr) => {
        (($a) << 22)
    };
}
macro_rules! colorspace_sh {
    ($s:expr) => {
        (($s) << 16)
    };
}
macro_rules! planar_sh {
    ($p:expr) => {
        (($p) << 12)
    };
}
macro_rules! channels_sh {
    ($c:expr) => {
        (($c) << 3)
    };
}
macro_rules! bytes_sh {
    ($b:expr) => {
        ($b)
    };
}

// These macros unpack format specifiers into integers.
macro_rules! t_float {
    ($a:expr) => {
        ($a >> 22) & 1
    };
}
macro_rules! t_colorspace {
    ($s:expr) => {
        ($s >> 16) & 31
    };
}
macro_rules! t_planar {
    ($p:expr) => {
        ($p >> 12) & 1
    };
}
macro_rules! t_channels {
    ($c:expr) => {
        ($c >> 3) & 15
    };
}
macro_rules! t_bytes {
    ($b:expr) => {
        $b & 7
    };
}
