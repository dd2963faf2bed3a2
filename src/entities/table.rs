//! HTML5 named character references.
//!
//! Generated from the WHATWG entity list. Each row is the reference name
//! without its trailing `;`, the expansion, and whether browsers also accept
//! the name with the `;` missing.

/// Length of the longest name in [`ENTITIES`].
pub(crate) const LONGEST_NAME: usize = 31;

pub(crate) static ENTITIES: &[(&str, &str, bool)] = &[
    ("AElig", "\u{c6}", true),
    ("AMP", "\u{26}", true),
    ("Aacute", "\u{c1}", true),
    ("Abreve", "\u{102}", false),
    ("Acirc", "\u{c2}", true),
    ("Acy", "\u{410}", false),
    ("Afr", "\u{1d504}", false),
    ("Agrave", "\u{c0}", true),
    ("Alpha", "\u{391}", false),
    ("Amacr", "\u{100}", false),
    ("And", "\u{2a53}", false),
    ("Aogon", "\u{104}", false),
    ("Aopf", "\u{1d538}", false),
    ("ApplyFunction", "\u{2061}", false),
    ("Aring", "\u{c5}", true),
    ("Ascr", "\u{1d49c}", false),
    ("Assign", "\u{2254}", false),
    ("Atilde", "\u{c3}", true),
    ("Auml", "\u{c4}", true),
    ("Backslash", "\u{2216}", false),
    ("Barv", "\u{2ae7}", false),
    ("Barwed", "\u{2306}", false),
    ("Bcy", "\u{411}", false),
    ("Because", "\u{2235}", false),
    ("Bernoullis", "\u{212c}", false),
    ("Beta", "\u{392}", false),
    ("Bfr", "\u{1d505}", false),
    ("Bopf", "\u{1d539}", false),
    ("Breve", "\u{2d8}", false),
    ("Bscr", "\u{212c}", false),
    ("Bumpeq", "\u{224e}", false),
    ("CHcy", "\u{427}", false),
    ("COPY", "\u{a9}", true),
    ("Cacute", "\u{106}", false),
    ("Cap", "\u{22d2}", false),
    ("CapitalDifferentialD", "\u{2145}", false),
    ("Cayleys", "\u{212d}", false),
    ("Ccaron", "\u{10c}", false),
    ("Ccedil", "\u{c7}", true),
    ("Ccirc", "\u{108}", false),
    ("Cconint", "\u{2230}", false),
    ("Cdot", "\u{10a}", false),
    ("Cedilla", "\u{b8}", false),
    ("CenterDot", "\u{b7}", false),
    ("Cfr", "\u{212d}", false),
    ("Chi", "\u{3a7}", false),
    ("CircleDot", "\u{2299}", false),
    ("CircleMinus", "\u{2296}", false),
    ("CirclePlus", "\u{2295}", false),
    ("CircleTimes", "\u{2297}", false),
    ("ClockwiseContourIntegral", "\u{2232}", false),
    ("CloseCurlyDoubleQuote", "\u{201d}", false),
    ("CloseCurlyQuote", "\u{2019}", false),
    ("Colon", "\u{2237}", false),
    ("Colone", "\u{2a74}", false),
    ("Congruent", "\u{2261}", false),
    ("Conint", "\u{222f}", false),
    ("ContourIntegral", "\u{222e}", false),
    ("Copf", "\u{2102}", false),
    ("Coproduct", "\u{2210}", false),
    ("CounterClockwiseContourIntegral", "\u{2233}", false),
    ("Cross", "\u{2a2f}", false),
    ("Cscr", "\u{1d49e}", false),
    ("Cup", "\u{22d3}", false),
    ("CupCap", "\u{224d}", false),
    ("DD", "\u{2145}", false),
    ("DDotrahd", "\u{2911}", false),
    ("DJcy", "\u{402}", false),
    ("DScy", "\u{405}", false),
    ("DZcy", "\u{40f}", false),
    ("Dagger", "\u{2021}", false),
    ("Darr", "\u{21a1}", false),
    ("Dashv", "\u{2ae4}", false),
    ("Dcaron", "\u{10e}", false),
    ("Dcy", "\u{414}", false),
    ("Del", "\u{2207}", false),
    ("Delta", "\u{394}", false),
    ("Dfr", "\u{1d507}", false),
    ("DiacriticalAcute", "\u{b4}", false),
    ("DiacriticalDot", "\u{2d9}", false),
    ("DiacriticalDoubleAcute", "\u{2dd}", false),
    ("DiacriticalGrave", "\u{60}", false),
    ("DiacriticalTilde", "\u{2dc}", false),
    ("Diamond", "\u{22c4}", false),
    ("DifferentialD", "\u{2146}", false),
    ("Dopf", "\u{1d53b}", false),
    ("Dot", "\u{a8}", false),
    ("DotDot", "\u{20dc}", false),
    ("DotEqual", "\u{2250}", false),
    ("DoubleContourIntegral", "\u{222f}", false),
    ("DoubleDot", "\u{a8}", false),
    ("DoubleDownArrow", "\u{21d3}", false),
    ("DoubleLeftArrow", "\u{21d0}", false),
    ("DoubleLeftRightArrow", "\u{21d4}", false),
    ("DoubleLeftTee", "\u{2ae4}", false),
    ("DoubleLongLeftArrow", "\u{27f8}", false),
    ("DoubleLongLeftRightArrow", "\u{27fa}", false),
    ("DoubleLongRightArrow", "\u{27f9}", false),
    ("DoubleRightArrow", "\u{21d2}", false),
    ("DoubleRightTee", "\u{22a8}", false),
    ("DoubleUpArrow", "\u{21d1}", false),
    ("DoubleUpDownArrow", "\u{21d5}", false),
    ("DoubleVerticalBar", "\u{2225}", false),
    ("DownArrow", "\u{2193}", false),
    ("DownArrowBar", "\u{2913}", false),
    ("DownArrowUpArrow", "\u{21f5}", false),
    ("DownBreve", "\u{311}", false),
    ("DownLeftRightVector", "\u{2950}", false),
    ("DownLeftTeeVector", "\u{295e}", false),
    ("DownLeftVector", "\u{21bd}", false),
    ("DownLeftVectorBar", "\u{2956}", false),
    ("DownRightTeeVector", "\u{295f}", false),
    ("DownRightVector", "\u{21c1}", false),
    ("DownRightVectorBar", "\u{2957}", false),
    ("DownTee", "\u{22a4}", false),
    ("DownTeeArrow", "\u{21a7}", false),
    ("Downarrow", "\u{21d3}", false),
    ("Dscr", "\u{1d49f}", false),
    ("Dstrok", "\u{110}", false),
    ("ENG", "\u{14a}", false),
    ("ETH", "\u{d0}", true),
    ("Eacute", "\u{c9}", true),
    ("Ecaron", "\u{11a}", false),
    ("Ecirc", "\u{ca}", true),
    ("Ecy", "\u{42d}", false),
    ("Edot", "\u{116}", false),
    ("Efr", "\u{1d508}", false),
    ("Egrave", "\u{c8}", true),
    ("Element", "\u{2208}", false),
    ("Emacr", "\u{112}", false),
    ("EmptySmallSquare", "\u{25fb}", false),
    ("EmptyVerySmallSquare", "\u{25ab}", false),
    ("Eogon", "\u{118}", false),
    ("Eopf", "\u{1d53c}", false),
    ("Epsilon", "\u{395}", false),
    ("Equal", "\u{2a75}", false),
    ("EqualTilde", "\u{2242}", false),
    ("Equilibrium", "\u{21cc}", false),
    ("Escr", "\u{2130}", false),
    ("Esim", "\u{2a73}", false),
    ("Eta", "\u{397}", false),
    ("Euml", "\u{cb}", true),
    ("Exists", "\u{2203}", false),
    ("ExponentialE", "\u{2147}", false),
    ("Fcy", "\u{424}", false),
    ("Ffr", "\u{1d509}", false),
    ("FilledSmallSquare", "\u{25fc}", false),
    ("FilledVerySmallSquare", "\u{25aa}", false),
    ("Fopf", "\u{1d53d}", false),
    ("ForAll", "\u{2200}", false),
    ("Fouriertrf", "\u{2131}", false),
    ("Fscr", "\u{2131}", false),
    ("GJcy", "\u{403}", false),
    ("GT", "\u{3e}", true),
    ("Gamma", "\u{393}", false),
    ("Gammad", "\u{3dc}", false),
    ("Gbreve", "\u{11e}", false),
    ("Gcedil", "\u{122}", false),
    ("Gcirc", "\u{11c}", false),
    ("Gcy", "\u{413}", false),
    ("Gdot", "\u{120}", false),
    ("Gfr", "\u{1d50a}", false),
    ("Gg", "\u{22d9}", false),
    ("Gopf", "\u{1d53e}", false),
    ("GreaterEqual", "\u{2265}", false),
    ("GreaterEqualLess", "\u{22db}", false),
    ("GreaterFullEqual", "\u{2267}", false),
    ("GreaterGreater", "\u{2aa2}", false),
    ("GreaterLess", "\u{2277}", false),
    ("GreaterSlantEqual", "\u{2a7e}", false),
    ("GreaterTilde", "\u{2273}", false),
    ("Gscr", "\u{1d4a2}", false),
    ("Gt", "\u{226b}", false),
    ("HARDcy", "\u{42a}", false),
    ("Hacek", "\u{2c7}", false),
    ("Hat", "\u{5e}", false),
    ("Hcirc", "\u{124}", false),
    ("Hfr", "\u{210c}", false),
    ("HilbertSpace", "\u{210b}", false),
    ("Hopf", "\u{210d}", false),
    ("HorizontalLine", "\u{2500}", false),
    ("Hscr", "\u{210b}", false),
    ("Hstrok", "\u{126}", false),
    ("HumpDownHump", "\u{224e}", false),
    ("HumpEqual", "\u{224f}", false),
    ("IEcy", "\u{415}", false),
    ("IJlig", "\u{132}", false),
    ("IOcy", "\u{401}", false),
    ("Iacute", "\u{cd}", true),
    ("Icirc", "\u{ce}", true),
    ("Icy", "\u{418}", false),
    ("Idot", "\u{130}", false),
    ("Ifr", "\u{2111}", false),
    ("Igrave", "\u{cc}", true),
    ("Im", "\u{2111}", false),
    ("Imacr", "\u{12a}", false),
    ("ImaginaryI", "\u{2148}", false),
    ("Implies", "\u{21d2}", false),
    ("Int", "\u{222c}", false),
    ("Integral", "\u{222b}", false),
    ("Intersection", "\u{22c2}", false),
    ("InvisibleComma", "\u{2063}", false),
    ("InvisibleTimes", "\u{2062}", false),
    ("Iogon", "\u{12e}", false),
    ("Iopf", "\u{1d540}", false),
    ("Iota", "\u{399}", false),
    ("Iscr", "\u{2110}", false),
    ("Itilde", "\u{128}", false),
    ("Iukcy", "\u{406}", false),
    ("Iuml", "\u{cf}", true),
    ("Jcirc", "\u{134}", false),
    ("Jcy", "\u{419}", false),
    ("Jfr", "\u{1d50d}", false),
    ("Jopf", "\u{1d541}", false),
    ("Jscr", "\u{1d4a5}", false),
    ("Jsercy", "\u{408}", false),
    ("Jukcy", "\u{404}", false),
    ("KHcy", "\u{425}", false),
    ("KJcy", "\u{40c}", false),
    ("Kappa", "\u{39a}", false),
    ("Kcedil", "\u{136}", false),
    ("Kcy", "\u{41a}", false),
    ("Kfr", "\u{1d50e}", false),
    ("Kopf", "\u{1d542}", false),
    ("Kscr", "\u{1d4a6}", false),
    ("LJcy", "\u{409}", false),
    ("LT", "\u{3c}", true),
    ("Lacute", "\u{139}", false),
    ("Lambda", "\u{39b}", false),
    ("Lang", "\u{27ea}", false),
    ("Laplacetrf", "\u{2112}", false),
    ("Larr", "\u{219e}", false),
    ("Lcaron", "\u{13d}", false),
    ("Lcedil", "\u{13b}", false),
    ("Lcy", "\u{41b}", false),
    ("LeftAngleBracket", "\u{27e8}", false),
    ("LeftArrow", "\u{2190}", false),
    ("LeftArrowBar", "\u{21e4}", false),
    ("LeftArrowRightArrow", "\u{21c6}", false),
    ("LeftCeiling", "\u{2308}", false),
    ("LeftDoubleBracket", "\u{27e6}", false),
    ("LeftDownTeeVector", "\u{2961}", false),
    ("LeftDownVector", "\u{21c3}", false),
    ("LeftDownVectorBar", "\u{2959}", false),
    ("LeftFloor", "\u{230a}", false),
    ("LeftRightArrow", "\u{2194}", false),
    ("LeftRightVector", "\u{294e}", false),
    ("LeftTee", "\u{22a3}", false),
    ("LeftTeeArrow", "\u{21a4}", false),
    ("LeftTeeVector", "\u{295a}", false),
    ("LeftTriangle", "\u{22b2}", false),
    ("LeftTriangleBar", "\u{29cf}", false),
    ("LeftTriangleEqual", "\u{22b4}", false),
    ("LeftUpDownVector", "\u{2951}", false),
    ("LeftUpTeeVector", "\u{2960}", false),
    ("LeftUpVector", "\u{21bf}", false),
    ("LeftUpVectorBar", "\u{2958}", false),
    ("LeftVector", "\u{21bc}", false),
    ("LeftVectorBar", "\u{2952}", false),
    ("Leftarrow", "\u{21d0}", false),
    ("Leftrightarrow", "\u{21d4}", false),
    ("LessEqualGreater", "\u{22da}", false),
    ("LessFullEqual", "\u{2266}", false),
    ("LessGreater", "\u{2276}", false),
    ("LessLess", "\u{2aa1}", false),
    ("LessSlantEqual", "\u{2a7d}", false),
    ("LessTilde", "\u{2272}", false),
    ("Lfr", "\u{1d50f}", false),
    ("Ll", "\u{22d8}", false),
    ("Lleftarrow", "\u{21da}", false),
    ("Lmidot", "\u{13f}", false),
    ("LongLeftArrow", "\u{27f5}", false),
    ("LongLeftRightArrow", "\u{27f7}", false),
    ("LongRightArrow", "\u{27f6}", false),
    ("Longleftarrow", "\u{27f8}", false),
    ("Longleftrightarrow", "\u{27fa}", false),
    ("Longrightarrow", "\u{27f9}", false),
    ("Lopf", "\u{1d543}", false),
    ("LowerLeftArrow", "\u{2199}", false),
    ("LowerRightArrow", "\u{2198}", false),
    ("Lscr", "\u{2112}", false),
    ("Lsh", "\u{21b0}", false),
    ("Lstrok", "\u{141}", false),
    ("Lt", "\u{226a}", false),
    ("Map", "\u{2905}", false),
    ("Mcy", "\u{41c}", false),
    ("MediumSpace", "\u{205f}", false),
    ("Mellintrf", "\u{2133}", false),
    ("Mfr", "\u{1d510}", false),
    ("MinusPlus", "\u{2213}", false),
    ("Mopf", "\u{1d544}", false),
    ("Mscr", "\u{2133}", false),
    ("Mu", "\u{39c}", false),
    ("NJcy", "\u{40a}", false),
    ("Nacute", "\u{143}", false),
    ("Ncaron", "\u{147}", false),
    ("Ncedil", "\u{145}", false),
    ("Ncy", "\u{41d}", false),
    ("NegativeMediumSpace", "\u{200b}", false),
    ("NegativeThickSpace", "\u{200b}", false),
    ("NegativeThinSpace", "\u{200b}", false),
    ("NegativeVeryThinSpace", "\u{200b}", false),
    ("NestedGreaterGreater", "\u{226b}", false),
    ("NestedLessLess", "\u{226a}", false),
    ("NewLine", "\u{a}", false),
    ("Nfr", "\u{1d511}", false),
    ("NoBreak", "\u{2060}", false),
    ("NonBreakingSpace", "\u{a0}", false),
    ("Nopf", "\u{2115}", false),
    ("Not", "\u{2aec}", false),
    ("NotCongruent", "\u{2262}", false),
    ("NotCupCap", "\u{226d}", false),
    ("NotDoubleVerticalBar", "\u{2226}", false),
    ("NotElement", "\u{2209}", false),
    ("NotEqual", "\u{2260}", false),
    ("NotEqualTilde", "\u{2242}\u{338}", false),
    ("NotExists", "\u{2204}", false),
    ("NotGreater", "\u{226f}", false),
    ("NotGreaterEqual", "\u{2271}", false),
    ("NotGreaterFullEqual", "\u{2267}\u{338}", false),
    ("NotGreaterGreater", "\u{226b}\u{338}", false),
    ("NotGreaterLess", "\u{2279}", false),
    ("NotGreaterSlantEqual", "\u{2a7e}\u{338}", false),
    ("NotGreaterTilde", "\u{2275}", false),
    ("NotHumpDownHump", "\u{224e}\u{338}", false),
    ("NotHumpEqual", "\u{224f}\u{338}", false),
    ("NotLeftTriangle", "\u{22ea}", false),
    ("NotLeftTriangleBar", "\u{29cf}\u{338}", false),
    ("NotLeftTriangleEqual", "\u{22ec}", false),
    ("NotLess", "\u{226e}", false),
    ("NotLessEqual", "\u{2270}", false),
    ("NotLessGreater", "\u{2278}", false),
    ("NotLessLess", "\u{226a}\u{338}", false),
    ("NotLessSlantEqual", "\u{2a7d}\u{338}", false),
    ("NotLessTilde", "\u{2274}", false),
    ("NotNestedGreaterGreater", "\u{2aa2}\u{338}", false),
    ("NotNestedLessLess", "\u{2aa1}\u{338}", false),
    ("NotPrecedes", "\u{2280}", false),
    ("NotPrecedesEqual", "\u{2aaf}\u{338}", false),
    ("NotPrecedesSlantEqual", "\u{22e0}", false),
    ("NotReverseElement", "\u{220c}", false),
    ("NotRightTriangle", "\u{22eb}", false),
    ("NotRightTriangleBar", "\u{29d0}\u{338}", false),
    ("NotRightTriangleEqual", "\u{22ed}", false),
    ("NotSquareSubset", "\u{228f}\u{338}", false),
    ("NotSquareSubsetEqual", "\u{22e2}", false),
    ("NotSquareSuperset", "\u{2290}\u{338}", false),
    ("NotSquareSupersetEqual", "\u{22e3}", false),
    ("NotSubset", "\u{2282}\u{20d2}", false),
    ("NotSubsetEqual", "\u{2288}", false),
    ("NotSucceeds", "\u{2281}", false),
    ("NotSucceedsEqual", "\u{2ab0}\u{338}", false),
    ("NotSucceedsSlantEqual", "\u{22e1}", false),
    ("NotSucceedsTilde", "\u{227f}\u{338}", false),
    ("NotSuperset", "\u{2283}\u{20d2}", false),
    ("NotSupersetEqual", "\u{2289}", false),
    ("NotTilde", "\u{2241}", false),
    ("NotTildeEqual", "\u{2244}", false),
    ("NotTildeFullEqual", "\u{2247}", false),
    ("NotTildeTilde", "\u{2249}", false),
    ("NotVerticalBar", "\u{2224}", false),
    ("Nscr", "\u{1d4a9}", false),
    ("Ntilde", "\u{d1}", true),
    ("Nu", "\u{39d}", false),
    ("OElig", "\u{152}", false),
    ("Oacute", "\u{d3}", true),
    ("Ocirc", "\u{d4}", true),
    ("Ocy", "\u{41e}", false),
    ("Odblac", "\u{150}", false),
    ("Ofr", "\u{1d512}", false),
    ("Ograve", "\u{d2}", true),
    ("Omacr", "\u{14c}", false),
    ("Omega", "\u{3a9}", false),
    ("Omicron", "\u{39f}", false),
    ("Oopf", "\u{1d546}", false),
    ("OpenCurlyDoubleQuote", "\u{201c}", false),
    ("OpenCurlyQuote", "\u{2018}", false),
    ("Or", "\u{2a54}", false),
    ("Oscr", "\u{1d4aa}", false),
    ("Oslash", "\u{d8}", true),
    ("Otilde", "\u{d5}", true),
    ("Otimes", "\u{2a37}", false),
    ("Ouml", "\u{d6}", true),
    ("OverBar", "\u{203e}", false),
    ("OverBrace", "\u{23de}", false),
    ("OverBracket", "\u{23b4}", false),
    ("OverParenthesis", "\u{23dc}", false),
    ("PartialD", "\u{2202}", false),
    ("Pcy", "\u{41f}", false),
    ("Pfr", "\u{1d513}", false),
    ("Phi", "\u{3a6}", false),
    ("Pi", "\u{3a0}", false),
    ("PlusMinus", "\u{b1}", false),
    ("Poincareplane", "\u{210c}", false),
    ("Popf", "\u{2119}", false),
    ("Pr", "\u{2abb}", false),
    ("Precedes", "\u{227a}", false),
    ("PrecedesEqual", "\u{2aaf}", false),
    ("PrecedesSlantEqual", "\u{227c}", false),
    ("PrecedesTilde", "\u{227e}", false),
    ("Prime", "\u{2033}", false),
    ("Product", "\u{220f}", false),
    ("Proportion", "\u{2237}", false),
    ("Proportional", "\u{221d}", false),
    ("Pscr", "\u{1d4ab}", false),
    ("Psi", "\u{3a8}", false),
    ("QUOT", "\u{22}", true),
    ("Qfr", "\u{1d514}", false),
    ("Qopf", "\u{211a}", false),
    ("Qscr", "\u{1d4ac}", false),
    ("RBarr", "\u{2910}", false),
    ("REG", "\u{ae}", true),
    ("Racute", "\u{154}", false),
    ("Rang", "\u{27eb}", false),
    ("Rarr", "\u{21a0}", false),
    ("Rarrtl", "\u{2916}", false),
    ("Rcaron", "\u{158}", false),
    ("Rcedil", "\u{156}", false),
    ("Rcy", "\u{420}", false),
    ("Re", "\u{211c}", false),
    ("ReverseElement", "\u{220b}", false),
    ("ReverseEquilibrium", "\u{21cb}", false),
    ("ReverseUpEquilibrium", "\u{296f}", false),
    ("Rfr", "\u{211c}", false),
    ("Rho", "\u{3a1}", false),
    ("RightAngleBracket", "\u{27e9}", false),
    ("RightArrow", "\u{2192}", false),
    ("RightArrowBar", "\u{21e5}", false),
    ("RightArrowLeftArrow", "\u{21c4}", false),
    ("RightCeiling", "\u{2309}", false),
    ("RightDoubleBracket", "\u{27e7}", false),
    ("RightDownTeeVector", "\u{295d}", false),
    ("RightDownVector", "\u{21c2}", false),
    ("RightDownVectorBar", "\u{2955}", false),
    ("RightFloor", "\u{230b}", false),
    ("RightTee", "\u{22a2}", false),
    ("RightTeeArrow", "\u{21a6}", false),
    ("RightTeeVector", "\u{295b}", false),
    ("RightTriangle", "\u{22b3}", false),
    ("RightTriangleBar", "\u{29d0}", false),
    ("RightTriangleEqual", "\u{22b5}", false),
    ("RightUpDownVector", "\u{294f}", false),
    ("RightUpTeeVector", "\u{295c}", false),
    ("RightUpVector", "\u{21be}", false),
    ("RightUpVectorBar", "\u{2954}", false),
    ("RightVector", "\u{21c0}", false),
    ("RightVectorBar", "\u{2953}", false),
    ("Rightarrow", "\u{21d2}", false),
    ("Ropf", "\u{211d}", false),
    ("RoundImplies", "\u{2970}", false),
    ("Rrightarrow", "\u{21db}", false),
    ("Rscr", "\u{211b}", false),
    ("Rsh", "\u{21b1}", false),
    ("RuleDelayed", "\u{29f4}", false),
    ("SHCHcy", "\u{429}", false),
    ("SHcy", "\u{428}", false),
    ("SOFTcy", "\u{42c}", false),
    ("Sacute", "\u{15a}", false),
    ("Sc", "\u{2abc}", false),
    ("Scaron", "\u{160}", false),
    ("Scedil", "\u{15e}", false),
    ("Scirc", "\u{15c}", false),
    ("Scy", "\u{421}", false),
    ("Sfr", "\u{1d516}", false),
    ("ShortDownArrow", "\u{2193}", false),
    ("ShortLeftArrow", "\u{2190}", false),
    ("ShortRightArrow", "\u{2192}", false),
    ("ShortUpArrow", "\u{2191}", false),
    ("Sigma", "\u{3a3}", false),
    ("SmallCircle", "\u{2218}", false),
    ("Sopf", "\u{1d54a}", false),
    ("Sqrt", "\u{221a}", false),
    ("Square", "\u{25a1}", false),
    ("SquareIntersection", "\u{2293}", false),
    ("SquareSubset", "\u{228f}", false),
    ("SquareSubsetEqual", "\u{2291}", false),
    ("SquareSuperset", "\u{2290}", false),
    ("SquareSupersetEqual", "\u{2292}", false),
    ("SquareUnion", "\u{2294}", false),
    ("Sscr", "\u{1d4ae}", false),
    ("Star", "\u{22c6}", false),
    ("Sub", "\u{22d0}", false),
    ("Subset", "\u{22d0}", false),
    ("SubsetEqual", "\u{2286}", false),
    ("Succeeds", "\u{227b}", false),
    ("SucceedsEqual", "\u{2ab0}", false),
    ("SucceedsSlantEqual", "\u{227d}", false),
    ("SucceedsTilde", "\u{227f}", false),
    ("SuchThat", "\u{220b}", false),
    ("Sum", "\u{2211}", false),
    ("Sup", "\u{22d1}", false),
    ("Superset", "\u{2283}", false),
    ("SupersetEqual", "\u{2287}", false),
    ("Supset", "\u{22d1}", false),
    ("THORN", "\u{de}", true),
    ("TRADE", "\u{2122}", false),
    ("TSHcy", "\u{40b}", false),
    ("TScy", "\u{426}", false),
    ("Tab", "\u{9}", false),
    ("Tau", "\u{3a4}", false),
    ("Tcaron", "\u{164}", false),
    ("Tcedil", "\u{162}", false),
    ("Tcy", "\u{422}", false),
    ("Tfr", "\u{1d517}", false),
    ("Therefore", "\u{2234}", false),
    ("Theta", "\u{398}", false),
    ("ThickSpace", "\u{205f}\u{200a}", false),
    ("ThinSpace", "\u{2009}", false),
    ("Tilde", "\u{223c}", false),
    ("TildeEqual", "\u{2243}", false),
    ("TildeFullEqual", "\u{2245}", false),
    ("TildeTilde", "\u{2248}", false),
    ("Topf", "\u{1d54b}", false),
    ("TripleDot", "\u{20db}", false),
    ("Tscr", "\u{1d4af}", false),
    ("Tstrok", "\u{166}", false),
    ("Uacute", "\u{da}", true),
    ("Uarr", "\u{219f}", false),
    ("Uarrocir", "\u{2949}", false),
    ("Ubrcy", "\u{40e}", false),
    ("Ubreve", "\u{16c}", false),
    ("Ucirc", "\u{db}", true),
    ("Ucy", "\u{423}", false),
    ("Udblac", "\u{170}", false),
    ("Ufr", "\u{1d518}", false),
    ("Ugrave", "\u{d9}", true),
    ("Umacr", "\u{16a}", false),
    ("UnderBar", "\u{5f}", false),
    ("UnderBrace", "\u{23df}", false),
    ("UnderBracket", "\u{23b5}", false),
    ("UnderParenthesis", "\u{23dd}", false),
    ("Union", "\u{22c3}", false),
    ("UnionPlus", "\u{228e}", false),
    ("Uogon", "\u{172}", false),
    ("Uopf", "\u{1d54c}", false),
    ("UpArrow", "\u{2191}", false),
    ("UpArrowBar", "\u{2912}", false),
    ("UpArrowDownArrow", "\u{21c5}", false),
    ("UpDownArrow", "\u{2195}", false),
    ("UpEquilibrium", "\u{296e}", false),
    ("UpTee", "\u{22a5}", false),
    ("UpTeeArrow", "\u{21a5}", false),
    ("Uparrow", "\u{21d1}", false),
    ("Updownarrow", "\u{21d5}", false),
    ("UpperLeftArrow", "\u{2196}", false),
    ("UpperRightArrow", "\u{2197}", false),
    ("Upsi", "\u{3d2}", false),
    ("Upsilon", "\u{3a5}", false),
    ("Uring", "\u{16e}", false),
    ("Uscr", "\u{1d4b0}", false),
    ("Utilde", "\u{168}", false),
    ("Uuml", "\u{dc}", true),
    ("VDash", "\u{22ab}", false),
    ("Vbar", "\u{2aeb}", false),
    ("Vcy", "\u{412}", false),
    ("Vdash", "\u{22a9}", false),
    ("Vdashl", "\u{2ae6}", false),
    ("Vee", "\u{22c1}", false),
    ("Verbar", "\u{2016}", false),
    ("Vert", "\u{2016}", false),
    ("VerticalBar", "\u{2223}", false),
    ("VerticalLine", "\u{7c}", false),
    ("VerticalSeparator", "\u{2758}", false),
    ("VerticalTilde", "\u{2240}", false),
    ("VeryThinSpace", "\u{200a}", false),
    ("Vfr", "\u{1d519}", false),
    ("Vopf", "\u{1d54d}", false),
    ("Vscr", "\u{1d4b1}", false),
    ("Vvdash", "\u{22aa}", false),
    ("Wcirc", "\u{174}", false),
    ("Wedge", "\u{22c0}", false),
    ("Wfr", "\u{1d51a}", false),
    ("Wopf", "\u{1d54e}", false),
    ("Wscr", "\u{1d4b2}", false),
    ("Xfr", "\u{1d51b}", false),
    ("Xi", "\u{39e}", false),
    ("Xopf", "\u{1d54f}", false),
    ("Xscr", "\u{1d4b3}", false),
    ("YAcy", "\u{42f}", false),
    ("YIcy", "\u{407}", false),
    ("YUcy", "\u{42e}", false),
    ("Yacute", "\u{dd}", true),
    ("Ycirc", "\u{176}", false),
    ("Ycy", "\u{42b}", false),
    ("Yfr", "\u{1d51c}", false),
    ("Yopf", "\u{1d550}", false),
    ("Yscr", "\u{1d4b4}", false),
    ("Yuml", "\u{178}", false),
    ("ZHcy", "\u{416}", false),
    ("Zacute", "\u{179}", false),
    ("Zcaron", "\u{17d}", false),
    ("Zcy", "\u{417}", false),
    ("Zdot", "\u{17b}", false),
    ("ZeroWidthSpace", "\u{200b}", false),
    ("Zeta", "\u{396}", false),
    ("Zfr", "\u{2128}", false),
    ("Zopf", "\u{2124}", false),
    ("Zscr", "\u{1d4b5}", false),
    ("aacute", "\u{e1}", true),
    ("abreve", "\u{103}", false),
    ("ac", "\u{223e}", false),
    ("acE", "\u{223e}\u{333}", false),
    ("acd", "\u{223f}", false),
    ("acirc", "\u{e2}", true),
    ("acute", "\u{b4}", true),
    ("acy", "\u{430}", false),
    ("aelig", "\u{e6}", true),
    ("af", "\u{2061}", false),
    ("afr", "\u{1d51e}", false),
    ("agrave", "\u{e0}", true),
    ("alefsym", "\u{2135}", false),
    ("aleph", "\u{2135}", false),
    ("alpha", "\u{3b1}", false),
    ("amacr", "\u{101}", false),
    ("amalg", "\u{2a3f}", false),
    ("amp", "\u{26}", true),
    ("and", "\u{2227}", false),
    ("andand", "\u{2a55}", false),
    ("andd", "\u{2a5c}", false),
    ("andslope", "\u{2a58}", false),
    ("andv", "\u{2a5a}", false),
    ("ang", "\u{2220}", false),
    ("ange", "\u{29a4}", false),
    ("angle", "\u{2220}", false),
    ("angmsd", "\u{2221}", false),
    ("angmsdaa", "\u{29a8}", false),
    ("angmsdab", "\u{29a9}", false),
    ("angmsdac", "\u{29aa}", false),
    ("angmsdad", "\u{29ab}", false),
    ("angmsdae", "\u{29ac}", false),
    ("angmsdaf", "\u{29ad}", false),
    ("angmsdag", "\u{29ae}", false),
    ("angmsdah", "\u{29af}", false),
    ("angrt", "\u{221f}", false),
    ("angrtvb", "\u{22be}", false),
    ("angrtvbd", "\u{299d}", false),
    ("angsph", "\u{2222}", false),
    ("angst", "\u{c5}", false),
    ("angzarr", "\u{237c}", false),
    ("aogon", "\u{105}", false),
    ("aopf", "\u{1d552}", false),
    ("ap", "\u{2248}", false),
    ("apE", "\u{2a70}", false),
    ("apacir", "\u{2a6f}", false),
    ("ape", "\u{224a}", false),
    ("apid", "\u{224b}", false),
    ("apos", "\u{27}", false),
    ("approx", "\u{2248}", false),
    ("approxeq", "\u{224a}", false),
    ("aring", "\u{e5}", true),
    ("ascr", "\u{1d4b6}", false),
    ("ast", "\u{2a}", false),
    ("asymp", "\u{2248}", false),
    ("asympeq", "\u{224d}", false),
    ("atilde", "\u{e3}", true),
    ("auml", "\u{e4}", true),
    ("awconint", "\u{2233}", false),
    ("awint", "\u{2a11}", false),
    ("bNot", "\u{2aed}", false),
    ("backcong", "\u{224c}", false),
    ("backepsilon", "\u{3f6}", false),
    ("backprime", "\u{2035}", false),
    ("backsim", "\u{223d}", false),
    ("backsimeq", "\u{22cd}", false),
    ("barvee", "\u{22bd}", false),
    ("barwed", "\u{2305}", false),
    ("barwedge", "\u{2305}", false),
    ("bbrk", "\u{23b5}", false),
    ("bbrktbrk", "\u{23b6}", false),
    ("bcong", "\u{224c}", false),
    ("bcy", "\u{431}", false),
    ("bdquo", "\u{201e}", false),
    ("becaus", "\u{2235}", false),
    ("because", "\u{2235}", false),
    ("bemptyv", "\u{29b0}", false),
    ("bepsi", "\u{3f6}", false),
    ("bernou", "\u{212c}", false),
    ("beta", "\u{3b2}", false),
    ("beth", "\u{2136}", false),
    ("between", "\u{226c}", false),
    ("bfr", "\u{1d51f}", false),
    ("bigcap", "\u{22c2}", false),
    ("bigcirc", "\u{25ef}", false),
    ("bigcup", "\u{22c3}", false),
    ("bigodot", "\u{2a00}", false),
    ("bigoplus", "\u{2a01}", false),
    ("bigotimes", "\u{2a02}", false),
    ("bigsqcup", "\u{2a06}", false),
    ("bigstar", "\u{2605}", false),
    ("bigtriangledown", "\u{25bd}", false),
    ("bigtriangleup", "\u{25b3}", false),
    ("biguplus", "\u{2a04}", false),
    ("bigvee", "\u{22c1}", false),
    ("bigwedge", "\u{22c0}", false),
    ("bkarow", "\u{290d}", false),
    ("blacklozenge", "\u{29eb}", false),
    ("blacksquare", "\u{25aa}", false),
    ("blacktriangle", "\u{25b4}", false),
    ("blacktriangledown", "\u{25be}", false),
    ("blacktriangleleft", "\u{25c2}", false),
    ("blacktriangleright", "\u{25b8}", false),
    ("blank", "\u{2423}", false),
    ("blk12", "\u{2592}", false),
    ("blk14", "\u{2591}", false),
    ("blk34", "\u{2593}", false),
    ("block", "\u{2588}", false),
    ("bne", "\u{3d}\u{20e5}", false),
    ("bnequiv", "\u{2261}\u{20e5}", false),
    ("bnot", "\u{2310}", false),
    ("bopf", "\u{1d553}", false),
    ("bot", "\u{22a5}", false),
    ("bottom", "\u{22a5}", false),
    ("bowtie", "\u{22c8}", false),
    ("boxDL", "\u{2557}", false),
    ("boxDR", "\u{2554}", false),
    ("boxDl", "\u{2556}", false),
    ("boxDr", "\u{2553}", false),
    ("boxH", "\u{2550}", false),
    ("boxHD", "\u{2566}", false),
    ("boxHU", "\u{2569}", false),
    ("boxHd", "\u{2564}", false),
    ("boxHu", "\u{2567}", false),
    ("boxUL", "\u{255d}", false),
    ("boxUR", "\u{255a}", false),
    ("boxUl", "\u{255c}", false),
    ("boxUr", "\u{2559}", false),
    ("boxV", "\u{2551}", false),
    ("boxVH", "\u{256c}", false),
    ("boxVL", "\u{2563}", false),
    ("boxVR", "\u{2560}", false),
    ("boxVh", "\u{256b}", false),
    ("boxVl", "\u{2562}", false),
    ("boxVr", "\u{255f}", false),
    ("boxbox", "\u{29c9}", false),
    ("boxdL", "\u{2555}", false),
    ("boxdR", "\u{2552}", false),
    ("boxdl", "\u{2510}", false),
    ("boxdr", "\u{250c}", false),
    ("boxh", "\u{2500}", false),
    ("boxhD", "\u{2565}", false),
    ("boxhU", "\u{2568}", false),
    ("boxhd", "\u{252c}", false),
    ("boxhu", "\u{2534}", false),
    ("boxminus", "\u{229f}", false),
    ("boxplus", "\u{229e}", false),
    ("boxtimes", "\u{22a0}", false),
    ("boxuL", "\u{255b}", false),
    ("boxuR", "\u{2558}", false),
    ("boxul", "\u{2518}", false),
    ("boxur", "\u{2514}", false),
    ("boxv", "\u{2502}", false),
    ("boxvH", "\u{256a}", false),
    ("boxvL", "\u{2561}", false),
    ("boxvR", "\u{255e}", false),
    ("boxvh", "\u{253c}", false),
    ("boxvl", "\u{2524}", false),
    ("boxvr", "\u{251c}", false),
    ("bprime", "\u{2035}", false),
    ("breve", "\u{2d8}", false),
    ("brvbar", "\u{a6}", true),
    ("bscr", "\u{1d4b7}", false),
    ("bsemi", "\u{204f}", false),
    ("bsim", "\u{223d}", false),
    ("bsime", "\u{22cd}", false),
    ("bsol", "\u{5c}", false),
    ("bsolb", "\u{29c5}", false),
    ("bsolhsub", "\u{27c8}", false),
    ("bull", "\u{2022}", false),
    ("bullet", "\u{2022}", false),
    ("bump", "\u{224e}", false),
    ("bumpE", "\u{2aae}", false),
    ("bumpe", "\u{224f}", false),
    ("bumpeq", "\u{224f}", false),
    ("cacute", "\u{107}", false),
    ("cap", "\u{2229}", false),
    ("capand", "\u{2a44}", false),
    ("capbrcup", "\u{2a49}", false),
    ("capcap", "\u{2a4b}", false),
    ("capcup", "\u{2a47}", false),
    ("capdot", "\u{2a40}", false),
    ("caps", "\u{2229}\u{fe00}", false),
    ("caret", "\u{2041}", false),
    ("caron", "\u{2c7}", false),
    ("ccaps", "\u{2a4d}", false),
    ("ccaron", "\u{10d}", false),
    ("ccedil", "\u{e7}", true),
    ("ccirc", "\u{109}", false),
    ("ccups", "\u{2a4c}", false),
    ("ccupssm", "\u{2a50}", false),
    ("cdot", "\u{10b}", false),
    ("cedil", "\u{b8}", true),
    ("cemptyv", "\u{29b2}", false),
    ("cent", "\u{a2}", true),
    ("centerdot", "\u{b7}", false),
    ("cfr", "\u{1d520}", false),
    ("chcy", "\u{447}", false),
    ("check", "\u{2713}", false),
    ("checkmark", "\u{2713}", false),
    ("chi", "\u{3c7}", false),
    ("cir", "\u{25cb}", false),
    ("cirE", "\u{29c3}", false),
    ("circ", "\u{2c6}", false),
    ("circeq", "\u{2257}", false),
    ("circlearrowleft", "\u{21ba}", false),
    ("circlearrowright", "\u{21bb}", false),
    ("circledR", "\u{ae}", false),
    ("circledS", "\u{24c8}", false),
    ("circledast", "\u{229b}", false),
    ("circledcirc", "\u{229a}", false),
    ("circleddash", "\u{229d}", false),
    ("cire", "\u{2257}", false),
    ("cirfnint", "\u{2a10}", false),
    ("cirmid", "\u{2aef}", false),
    ("cirscir", "\u{29c2}", false),
    ("clubs", "\u{2663}", false),
    ("clubsuit", "\u{2663}", false),
    ("colon", "\u{3a}", false),
    ("colone", "\u{2254}", false),
    ("coloneq", "\u{2254}", false),
    ("comma", "\u{2c}", false),
    ("commat", "\u{40}", false),
    ("comp", "\u{2201}", false),
    ("compfn", "\u{2218}", false),
    ("complement", "\u{2201}", false),
    ("complexes", "\u{2102}", false),
    ("cong", "\u{2245}", false),
    ("congdot", "\u{2a6d}", false),
    ("conint", "\u{222e}", false),
    ("copf", "\u{1d554}", false),
    ("coprod", "\u{2210}", false),
    ("copy", "\u{a9}", true),
    ("copysr", "\u{2117}", false),
    ("crarr", "\u{21b5}", false),
    ("cross", "\u{2717}", false),
    ("cscr", "\u{1d4b8}", false),
    ("csub", "\u{2acf}", false),
    ("csube", "\u{2ad1}", false),
    ("csup", "\u{2ad0}", false),
    ("csupe", "\u{2ad2}", false),
    ("ctdot", "\u{22ef}", false),
    ("cudarrl", "\u{2938}", false),
    ("cudarrr", "\u{2935}", false),
    ("cuepr", "\u{22de}", false),
    ("cuesc", "\u{22df}", false),
    ("cularr", "\u{21b6}", false),
    ("cularrp", "\u{293d}", false),
    ("cup", "\u{222a}", false),
    ("cupbrcap", "\u{2a48}", false),
    ("cupcap", "\u{2a46}", false),
    ("cupcup", "\u{2a4a}", false),
    ("cupdot", "\u{228d}", false),
    ("cupor", "\u{2a45}", false),
    ("cups", "\u{222a}\u{fe00}", false),
    ("curarr", "\u{21b7}", false),
    ("curarrm", "\u{293c}", false),
    ("curlyeqprec", "\u{22de}", false),
    ("curlyeqsucc", "\u{22df}", false),
    ("curlyvee", "\u{22ce}", false),
    ("curlywedge", "\u{22cf}", false),
    ("curren", "\u{a4}", true),
    ("curvearrowleft", "\u{21b6}", false),
    ("curvearrowright", "\u{21b7}", false),
    ("cuvee", "\u{22ce}", false),
    ("cuwed", "\u{22cf}", false),
    ("cwconint", "\u{2232}", false),
    ("cwint", "\u{2231}", false),
    ("cylcty", "\u{232d}", false),
    ("dArr", "\u{21d3}", false),
    ("dHar", "\u{2965}", false),
    ("dagger", "\u{2020}", false),
    ("daleth", "\u{2138}", false),
    ("darr", "\u{2193}", false),
    ("dash", "\u{2010}", false),
    ("dashv", "\u{22a3}", false),
    ("dbkarow", "\u{290f}", false),
    ("dblac", "\u{2dd}", false),
    ("dcaron", "\u{10f}", false),
    ("dcy", "\u{434}", false),
    ("dd", "\u{2146}", false),
    ("ddagger", "\u{2021}", false),
    ("ddarr", "\u{21ca}", false),
    ("ddotseq", "\u{2a77}", false),
    ("deg", "\u{b0}", true),
    ("delta", "\u{3b4}", false),
    ("demptyv", "\u{29b1}", false),
    ("dfisht", "\u{297f}", false),
    ("dfr", "\u{1d521}", false),
    ("dharl", "\u{21c3}", false),
    ("dharr", "\u{21c2}", false),
    ("diam", "\u{22c4}", false),
    ("diamond", "\u{22c4}", false),
    ("diamondsuit", "\u{2666}", false),
    ("diams", "\u{2666}", false),
    ("die", "\u{a8}", false),
    ("digamma", "\u{3dd}", false),
    ("disin", "\u{22f2}", false),
    ("div", "\u{f7}", false),
    ("divide", "\u{f7}", true),
    ("divideontimes", "\u{22c7}", false),
    ("divonx", "\u{22c7}", false),
    ("djcy", "\u{452}", false),
    ("dlcorn", "\u{231e}", false),
    ("dlcrop", "\u{230d}", false),
    ("dollar", "\u{24}", false),
    ("dopf", "\u{1d555}", false),
    ("dot", "\u{2d9}", false),
    ("doteq", "\u{2250}", false),
    ("doteqdot", "\u{2251}", false),
    ("dotminus", "\u{2238}", false),
    ("dotplus", "\u{2214}", false),
    ("dotsquare", "\u{22a1}", false),
    ("doublebarwedge", "\u{2306}", false),
    ("downarrow", "\u{2193}", false),
    ("downdownarrows", "\u{21ca}", false),
    ("downharpoonleft", "\u{21c3}", false),
    ("downharpoonright", "\u{21c2}", false),
    ("drbkarow", "\u{2910}", false),
    ("drcorn", "\u{231f}", false),
    ("drcrop", "\u{230c}", false),
    ("dscr", "\u{1d4b9}", false),
    ("dscy", "\u{455}", false),
    ("dsol", "\u{29f6}", false),
    ("dstrok", "\u{111}", false),
    ("dtdot", "\u{22f1}", false),
    ("dtri", "\u{25bf}", false),
    ("dtrif", "\u{25be}", false),
    ("duarr", "\u{21f5}", false),
    ("duhar", "\u{296f}", false),
    ("dwangle", "\u{29a6}", false),
    ("dzcy", "\u{45f}", false),
    ("dzigrarr", "\u{27ff}", false),
    ("eDDot", "\u{2a77}", false),
    ("eDot", "\u{2251}", false),
    ("eacute", "\u{e9}", true),
    ("easter", "\u{2a6e}", false),
    ("ecaron", "\u{11b}", false),
    ("ecir", "\u{2256}", false),
    ("ecirc", "\u{ea}", true),
    ("ecolon", "\u{2255}", false),
    ("ecy", "\u{44d}", false),
    ("edot", "\u{117}", false),
    ("ee", "\u{2147}", false),
    ("efDot", "\u{2252}", false),
    ("efr", "\u{1d522}", false),
    ("eg", "\u{2a9a}", false),
    ("egrave", "\u{e8}", true),
    ("egs", "\u{2a96}", false),
    ("egsdot", "\u{2a98}", false),
    ("el", "\u{2a99}", false),
    ("elinters", "\u{23e7}", false),
    ("ell", "\u{2113}", false),
    ("els", "\u{2a95}", false),
    ("elsdot", "\u{2a97}", false),
    ("emacr", "\u{113}", false),
    ("empty", "\u{2205}", false),
    ("emptyset", "\u{2205}", false),
    ("emptyv", "\u{2205}", false),
    ("emsp", "\u{2003}", false),
    ("emsp13", "\u{2004}", false),
    ("emsp14", "\u{2005}", false),
    ("eng", "\u{14b}", false),
    ("ensp", "\u{2002}", false),
    ("eogon", "\u{119}", false),
    ("eopf", "\u{1d556}", false),
    ("epar", "\u{22d5}", false),
    ("eparsl", "\u{29e3}", false),
    ("eplus", "\u{2a71}", false),
    ("epsi", "\u{3b5}", false),
    ("epsilon", "\u{3b5}", false),
    ("epsiv", "\u{3f5}", false),
    ("eqcirc", "\u{2256}", false),
    ("eqcolon", "\u{2255}", false),
    ("eqsim", "\u{2242}", false),
    ("eqslantgtr", "\u{2a96}", false),
    ("eqslantless", "\u{2a95}", false),
    ("equals", "\u{3d}", false),
    ("equest", "\u{225f}", false),
    ("equiv", "\u{2261}", false),
    ("equivDD", "\u{2a78}", false),
    ("eqvparsl", "\u{29e5}", false),
    ("erDot", "\u{2253}", false),
    ("erarr", "\u{2971}", false),
    ("escr", "\u{212f}", false),
    ("esdot", "\u{2250}", false),
    ("esim", "\u{2242}", false),
    ("eta", "\u{3b7}", false),
    ("eth", "\u{f0}", true),
    ("euml", "\u{eb}", true),
    ("euro", "\u{20ac}", false),
    ("excl", "\u{21}", false),
    ("exist", "\u{2203}", false),
    ("expectation", "\u{2130}", false),
    ("exponentiale", "\u{2147}", false),
    ("fallingdotseq", "\u{2252}", false),
    ("fcy", "\u{444}", false),
    ("female", "\u{2640}", false),
    ("ffilig", "\u{fb03}", false),
    ("fflig", "\u{fb00}", false),
    ("ffllig", "\u{fb04}", false),
    ("ffr", "\u{1d523}", false),
    ("filig", "\u{fb01}", false),
    ("fjlig", "\u{66}\u{6a}", false),
    ("flat", "\u{266d}", false),
    ("fllig", "\u{fb02}", false),
    ("fltns", "\u{25b1}", false),
    ("fnof", "\u{192}", false),
    ("fopf", "\u{1d557}", false),
    ("forall", "\u{2200}", false),
    ("fork", "\u{22d4}", false),
    ("forkv", "\u{2ad9}", false),
    ("fpartint", "\u{2a0d}", false),
    ("frac12", "\u{bd}", true),
    ("frac13", "\u{2153}", false),
    ("frac14", "\u{bc}", true),
    ("frac15", "\u{2155}", false),
    ("frac16", "\u{2159}", false),
    ("frac18", "\u{215b}", false),
    ("frac23", "\u{2154}", false),
    ("frac25", "\u{2156}", false),
    ("frac34", "\u{be}", true),
    ("frac35", "\u{2157}", false),
    ("frac38", "\u{215c}", false),
    ("frac45", "\u{2158}", false),
    ("frac56", "\u{215a}", false),
    ("frac58", "\u{215d}", false),
    ("frac78", "\u{215e}", false),
    ("frasl", "\u{2044}", false),
    ("frown", "\u{2322}", false),
    ("fscr", "\u{1d4bb}", false),
    ("gE", "\u{2267}", false),
    ("gEl", "\u{2a8c}", false),
    ("gacute", "\u{1f5}", false),
    ("gamma", "\u{3b3}", false),
    ("gammad", "\u{3dd}", false),
    ("gap", "\u{2a86}", false),
    ("gbreve", "\u{11f}", false),
    ("gcirc", "\u{11d}", false),
    ("gcy", "\u{433}", false),
    ("gdot", "\u{121}", false),
    ("ge", "\u{2265}", false),
    ("gel", "\u{22db}", false),
    ("geq", "\u{2265}", false),
    ("geqq", "\u{2267}", false),
    ("geqslant", "\u{2a7e}", false),
    ("ges", "\u{2a7e}", false),
    ("gescc", "\u{2aa9}", false),
    ("gesdot", "\u{2a80}", false),
    ("gesdoto", "\u{2a82}", false),
    ("gesdotol", "\u{2a84}", false),
    ("gesl", "\u{22db}\u{fe00}", false),
    ("gesles", "\u{2a94}", false),
    ("gfr", "\u{1d524}", false),
    ("gg", "\u{226b}", false),
    ("ggg", "\u{22d9}", false),
    ("gimel", "\u{2137}", false),
    ("gjcy", "\u{453}", false),
    ("gl", "\u{2277}", false),
    ("glE", "\u{2a92}", false),
    ("gla", "\u{2aa5}", false),
    ("glj", "\u{2aa4}", false),
    ("gnE", "\u{2269}", false),
    ("gnap", "\u{2a8a}", false),
    ("gnapprox", "\u{2a8a}", false),
    ("gne", "\u{2a88}", false),
    ("gneq", "\u{2a88}", false),
    ("gneqq", "\u{2269}", false),
    ("gnsim", "\u{22e7}", false),
    ("gopf", "\u{1d558}", false),
    ("grave", "\u{60}", false),
    ("gscr", "\u{210a}", false),
    ("gsim", "\u{2273}", false),
    ("gsime", "\u{2a8e}", false),
    ("gsiml", "\u{2a90}", false),
    ("gt", "\u{3e}", true),
    ("gtcc", "\u{2aa7}", false),
    ("gtcir", "\u{2a7a}", false),
    ("gtdot", "\u{22d7}", false),
    ("gtlPar", "\u{2995}", false),
    ("gtquest", "\u{2a7c}", false),
    ("gtrapprox", "\u{2a86}", false),
    ("gtrarr", "\u{2978}", false),
    ("gtrdot", "\u{22d7}", false),
    ("gtreqless", "\u{22db}", false),
    ("gtreqqless", "\u{2a8c}", false),
    ("gtrless", "\u{2277}", false),
    ("gtrsim", "\u{2273}", false),
    ("gvertneqq", "\u{2269}\u{fe00}", false),
    ("gvnE", "\u{2269}\u{fe00}", false),
    ("hArr", "\u{21d4}", false),
    ("hairsp", "\u{200a}", false),
    ("half", "\u{bd}", false),
    ("hamilt", "\u{210b}", false),
    ("hardcy", "\u{44a}", false),
    ("harr", "\u{2194}", false),
    ("harrcir", "\u{2948}", false),
    ("harrw", "\u{21ad}", false),
    ("hbar", "\u{210f}", false),
    ("hcirc", "\u{125}", false),
    ("hearts", "\u{2665}", false),
    ("heartsuit", "\u{2665}", false),
    ("hellip", "\u{2026}", false),
    ("hercon", "\u{22b9}", false),
    ("hfr", "\u{1d525}", false),
    ("hksearow", "\u{2925}", false),
    ("hkswarow", "\u{2926}", false),
    ("hoarr", "\u{21ff}", false),
    ("homtht", "\u{223b}", false),
    ("hookleftarrow", "\u{21a9}", false),
    ("hookrightarrow", "\u{21aa}", false),
    ("hopf", "\u{1d559}", false),
    ("horbar", "\u{2015}", false),
    ("hscr", "\u{1d4bd}", false),
    ("hslash", "\u{210f}", false),
    ("hstrok", "\u{127}", false),
    ("hybull", "\u{2043}", false),
    ("hyphen", "\u{2010}", false),
    ("iacute", "\u{ed}", true),
    ("ic", "\u{2063}", false),
    ("icirc", "\u{ee}", true),
    ("icy", "\u{438}", false),
    ("iecy", "\u{435}", false),
    ("iexcl", "\u{a1}", true),
    ("iff", "\u{21d4}", false),
    ("ifr", "\u{1d526}", false),
    ("igrave", "\u{ec}", true),
    ("ii", "\u{2148}", false),
    ("iiiint", "\u{2a0c}", false),
    ("iiint", "\u{222d}", false),
    ("iinfin", "\u{29dc}", false),
    ("iiota", "\u{2129}", false),
    ("ijlig", "\u{133}", false),
    ("imacr", "\u{12b}", false),
    ("image", "\u{2111}", false),
    ("imagline", "\u{2110}", false),
    ("imagpart", "\u{2111}", false),
    ("imath", "\u{131}", false),
    ("imof", "\u{22b7}", false),
    ("imped", "\u{1b5}", false),
    ("in", "\u{2208}", false),
    ("incare", "\u{2105}", false),
    ("infin", "\u{221e}", false),
    ("infintie", "\u{29dd}", false),
    ("inodot", "\u{131}", false),
    ("int", "\u{222b}", false),
    ("intcal", "\u{22ba}", false),
    ("integers", "\u{2124}", false),
    ("intercal", "\u{22ba}", false),
    ("intlarhk", "\u{2a17}", false),
    ("intprod", "\u{2a3c}", false),
    ("iocy", "\u{451}", false),
    ("iogon", "\u{12f}", false),
    ("iopf", "\u{1d55a}", false),
    ("iota", "\u{3b9}", false),
    ("iprod", "\u{2a3c}", false),
    ("iquest", "\u{bf}", true),
    ("iscr", "\u{1d4be}", false),
    ("isin", "\u{2208}", false),
    ("isinE", "\u{22f9}", false),
    ("isindot", "\u{22f5}", false),
    ("isins", "\u{22f4}", false),
    ("isinsv", "\u{22f3}", false),
    ("isinv", "\u{2208}", false),
    ("it", "\u{2062}", false),
    ("itilde", "\u{129}", false),
    ("iukcy", "\u{456}", false),
    ("iuml", "\u{ef}", true),
    ("jcirc", "\u{135}", false),
    ("jcy", "\u{439}", false),
    ("jfr", "\u{1d527}", false),
    ("jmath", "\u{237}", false),
    ("jopf", "\u{1d55b}", false),
    ("jscr", "\u{1d4bf}", false),
    ("jsercy", "\u{458}", false),
    ("jukcy", "\u{454}", false),
    ("kappa", "\u{3ba}", false),
    ("kappav", "\u{3f0}", false),
    ("kcedil", "\u{137}", false),
    ("kcy", "\u{43a}", false),
    ("kfr", "\u{1d528}", false),
    ("kgreen", "\u{138}", false),
    ("khcy", "\u{445}", false),
    ("kjcy", "\u{45c}", false),
    ("kopf", "\u{1d55c}", false),
    ("kscr", "\u{1d4c0}", false),
    ("lAarr", "\u{21da}", false),
    ("lArr", "\u{21d0}", false),
    ("lAtail", "\u{291b}", false),
    ("lBarr", "\u{290e}", false),
    ("lE", "\u{2266}", false),
    ("lEg", "\u{2a8b}", false),
    ("lHar", "\u{2962}", false),
    ("lacute", "\u{13a}", false),
    ("laemptyv", "\u{29b4}", false),
    ("lagran", "\u{2112}", false),
    ("lambda", "\u{3bb}", false),
    ("lang", "\u{27e8}", false),
    ("langd", "\u{2991}", false),
    ("langle", "\u{27e8}", false),
    ("lap", "\u{2a85}", false),
    ("laquo", "\u{ab}", true),
    ("larr", "\u{2190}", false),
    ("larrb", "\u{21e4}", false),
    ("larrbfs", "\u{291f}", false),
    ("larrfs", "\u{291d}", false),
    ("larrhk", "\u{21a9}", false),
    ("larrlp", "\u{21ab}", false),
    ("larrpl", "\u{2939}", false),
    ("larrsim", "\u{2973}", false),
    ("larrtl", "\u{21a2}", false),
    ("lat", "\u{2aab}", false),
    ("latail", "\u{2919}", false),
    ("late", "\u{2aad}", false),
    ("lates", "\u{2aad}\u{fe00}", false),
    ("lbarr", "\u{290c}", false),
    ("lbbrk", "\u{2772}", false),
    ("lbrace", "\u{7b}", false),
    ("lbrack", "\u{5b}", false),
    ("lbrke", "\u{298b}", false),
    ("lbrksld", "\u{298f}", false),
    ("lbrkslu", "\u{298d}", false),
    ("lcaron", "\u{13e}", false),
    ("lcedil", "\u{13c}", false),
    ("lceil", "\u{2308}", false),
    ("lcub", "\u{7b}", false),
    ("lcy", "\u{43b}", false),
    ("ldca", "\u{2936}", false),
    ("ldquo", "\u{201c}", false),
    ("ldquor", "\u{201e}", false),
    ("ldrdhar", "\u{2967}", false),
    ("ldrushar", "\u{294b}", false),
    ("ldsh", "\u{21b2}", false),
    ("le", "\u{2264}", false),
    ("leftarrow", "\u{2190}", false),
    ("leftarrowtail", "\u{21a2}", false),
    ("leftharpoondown", "\u{21bd}", false),
    ("leftharpoonup", "\u{21bc}", false),
    ("leftleftarrows", "\u{21c7}", false),
    ("leftrightarrow", "\u{2194}", false),
    ("leftrightarrows", "\u{21c6}", false),
    ("leftrightharpoons", "\u{21cb}", false),
    ("leftrightsquigarrow", "\u{21ad}", false),
    ("leftthreetimes", "\u{22cb}", false),
    ("leg", "\u{22da}", false),
    ("leq", "\u{2264}", false),
    ("leqq", "\u{2266}", false),
    ("leqslant", "\u{2a7d}", false),
    ("les", "\u{2a7d}", false),
    ("lescc", "\u{2aa8}", false),
    ("lesdot", "\u{2a7f}", false),
    ("lesdoto", "\u{2a81}", false),
    ("lesdotor", "\u{2a83}", false),
    ("lesg", "\u{22da}\u{fe00}", false),
    ("lesges", "\u{2a93}", false),
    ("lessapprox", "\u{2a85}", false),
    ("lessdot", "\u{22d6}", false),
    ("lesseqgtr", "\u{22da}", false),
    ("lesseqqgtr", "\u{2a8b}", false),
    ("lessgtr", "\u{2276}", false),
    ("lesssim", "\u{2272}", false),
    ("lfisht", "\u{297c}", false),
    ("lfloor", "\u{230a}", false),
    ("lfr", "\u{1d529}", false),
    ("lg", "\u{2276}", false),
    ("lgE", "\u{2a91}", false),
    ("lhard", "\u{21bd}", false),
    ("lharu", "\u{21bc}", false),
    ("lharul", "\u{296a}", false),
    ("lhblk", "\u{2584}", false),
    ("ljcy", "\u{459}", false),
    ("ll", "\u{226a}", false),
    ("llarr", "\u{21c7}", false),
    ("llcorner", "\u{231e}", false),
    ("llhard", "\u{296b}", false),
    ("lltri", "\u{25fa}", false),
    ("lmidot", "\u{140}", false),
    ("lmoust", "\u{23b0}", false),
    ("lmoustache", "\u{23b0}", false),
    ("lnE", "\u{2268}", false),
    ("lnap", "\u{2a89}", false),
    ("lnapprox", "\u{2a89}", false),
    ("lne", "\u{2a87}", false),
    ("lneq", "\u{2a87}", false),
    ("lneqq", "\u{2268}", false),
    ("lnsim", "\u{22e6}", false),
    ("loang", "\u{27ec}", false),
    ("loarr", "\u{21fd}", false),
    ("lobrk", "\u{27e6}", false),
    ("longleftarrow", "\u{27f5}", false),
    ("longleftrightarrow", "\u{27f7}", false),
    ("longmapsto", "\u{27fc}", false),
    ("longrightarrow", "\u{27f6}", false),
    ("looparrowleft", "\u{21ab}", false),
    ("looparrowright", "\u{21ac}", false),
    ("lopar", "\u{2985}", false),
    ("lopf", "\u{1d55d}", false),
    ("loplus", "\u{2a2d}", false),
    ("lotimes", "\u{2a34}", false),
    ("lowast", "\u{2217}", false),
    ("lowbar", "\u{5f}", false),
    ("loz", "\u{25ca}", false),
    ("lozenge", "\u{25ca}", false),
    ("lozf", "\u{29eb}", false),
    ("lpar", "\u{28}", false),
    ("lparlt", "\u{2993}", false),
    ("lrarr", "\u{21c6}", false),
    ("lrcorner", "\u{231f}", false),
    ("lrhar", "\u{21cb}", false),
    ("lrhard", "\u{296d}", false),
    ("lrm", "\u{200e}", false),
    ("lrtri", "\u{22bf}", false),
    ("lsaquo", "\u{2039}", false),
    ("lscr", "\u{1d4c1}", false),
    ("lsh", "\u{21b0}", false),
    ("lsim", "\u{2272}", false),
    ("lsime", "\u{2a8d}", false),
    ("lsimg", "\u{2a8f}", false),
    ("lsqb", "\u{5b}", false),
    ("lsquo", "\u{2018}", false),
    ("lsquor", "\u{201a}", false),
    ("lstrok", "\u{142}", false),
    ("lt", "\u{3c}", true),
    ("ltcc", "\u{2aa6}", false),
    ("ltcir", "\u{2a79}", false),
    ("ltdot", "\u{22d6}", false),
    ("lthree", "\u{22cb}", false),
    ("ltimes", "\u{22c9}", false),
    ("ltlarr", "\u{2976}", false),
    ("ltquest", "\u{2a7b}", false),
    ("ltrPar", "\u{2996}", false),
    ("ltri", "\u{25c3}", false),
    ("ltrie", "\u{22b4}", false),
    ("ltrif", "\u{25c2}", false),
    ("lurdshar", "\u{294a}", false),
    ("luruhar", "\u{2966}", false),
    ("lvertneqq", "\u{2268}\u{fe00}", false),
    ("lvnE", "\u{2268}\u{fe00}", false),
    ("mDDot", "\u{223a}", false),
    ("macr", "\u{af}", true),
    ("male", "\u{2642}", false),
    ("malt", "\u{2720}", false),
    ("maltese", "\u{2720}", false),
    ("map", "\u{21a6}", false),
    ("mapsto", "\u{21a6}", false),
    ("mapstodown", "\u{21a7}", false),
    ("mapstoleft", "\u{21a4}", false),
    ("mapstoup", "\u{21a5}", false),
    ("marker", "\u{25ae}", false),
    ("mcomma", "\u{2a29}", false),
    ("mcy", "\u{43c}", false),
    ("mdash", "\u{2014}", false),
    ("measuredangle", "\u{2221}", false),
    ("mfr", "\u{1d52a}", false),
    ("mho", "\u{2127}", false),
    ("micro", "\u{b5}", true),
    ("mid", "\u{2223}", false),
    ("midast", "\u{2a}", false),
    ("midcir", "\u{2af0}", false),
    ("middot", "\u{b7}", true),
    ("minus", "\u{2212}", false),
    ("minusb", "\u{229f}", false),
    ("minusd", "\u{2238}", false),
    ("minusdu", "\u{2a2a}", false),
    ("mlcp", "\u{2adb}", false),
    ("mldr", "\u{2026}", false),
    ("mnplus", "\u{2213}", false),
    ("models", "\u{22a7}", false),
    ("mopf", "\u{1d55e}", false),
    ("mp", "\u{2213}", false),
    ("mscr", "\u{1d4c2}", false),
    ("mstpos", "\u{223e}", false),
    ("mu", "\u{3bc}", false),
    ("multimap", "\u{22b8}", false),
    ("mumap", "\u{22b8}", false),
    ("nGg", "\u{22d9}\u{338}", false),
    ("nGt", "\u{226b}\u{20d2}", false),
    ("nGtv", "\u{226b}\u{338}", false),
    ("nLeftarrow", "\u{21cd}", false),
    ("nLeftrightarrow", "\u{21ce}", false),
    ("nLl", "\u{22d8}\u{338}", false),
    ("nLt", "\u{226a}\u{20d2}", false),
    ("nLtv", "\u{226a}\u{338}", false),
    ("nRightarrow", "\u{21cf}", false),
    ("nVDash", "\u{22af}", false),
    ("nVdash", "\u{22ae}", false),
    ("nabla", "\u{2207}", false),
    ("nacute", "\u{144}", false),
    ("nang", "\u{2220}\u{20d2}", false),
    ("nap", "\u{2249}", false),
    ("napE", "\u{2a70}\u{338}", false),
    ("napid", "\u{224b}\u{338}", false),
    ("napos", "\u{149}", false),
    ("napprox", "\u{2249}", false),
    ("natur", "\u{266e}", false),
    ("natural", "\u{266e}", false),
    ("naturals", "\u{2115}", false),
    ("nbsp", "\u{a0}", true),
    ("nbump", "\u{224e}\u{338}", false),
    ("nbumpe", "\u{224f}\u{338}", false),
    ("ncap", "\u{2a43}", false),
    ("ncaron", "\u{148}", false),
    ("ncedil", "\u{146}", false),
    ("ncong", "\u{2247}", false),
    ("ncongdot", "\u{2a6d}\u{338}", false),
    ("ncup", "\u{2a42}", false),
    ("ncy", "\u{43d}", false),
    ("ndash", "\u{2013}", false),
    ("ne", "\u{2260}", false),
    ("neArr", "\u{21d7}", false),
    ("nearhk", "\u{2924}", false),
    ("nearr", "\u{2197}", false),
    ("nearrow", "\u{2197}", false),
    ("nedot", "\u{2250}\u{338}", false),
    ("nequiv", "\u{2262}", false),
    ("nesear", "\u{2928}", false),
    ("nesim", "\u{2242}\u{338}", false),
    ("nexist", "\u{2204}", false),
    ("nexists", "\u{2204}", false),
    ("nfr", "\u{1d52b}", false),
    ("ngE", "\u{2267}\u{338}", false),
    ("nge", "\u{2271}", false),
    ("ngeq", "\u{2271}", false),
    ("ngeqq", "\u{2267}\u{338}", false),
    ("ngeqslant", "\u{2a7e}\u{338}", false),
    ("nges", "\u{2a7e}\u{338}", false),
    ("ngsim", "\u{2275}", false),
    ("ngt", "\u{226f}", false),
    ("ngtr", "\u{226f}", false),
    ("nhArr", "\u{21ce}", false),
    ("nharr", "\u{21ae}", false),
    ("nhpar", "\u{2af2}", false),
    ("ni", "\u{220b}", false),
    ("nis", "\u{22fc}", false),
    ("nisd", "\u{22fa}", false),
    ("niv", "\u{220b}", false),
    ("njcy", "\u{45a}", false),
    ("nlArr", "\u{21cd}", false),
    ("nlE", "\u{2266}\u{338}", false),
    ("nlarr", "\u{219a}", false),
    ("nldr", "\u{2025}", false),
    ("nle", "\u{2270}", false),
    ("nleftarrow", "\u{219a}", false),
    ("nleftrightarrow", "\u{21ae}", false),
    ("nleq", "\u{2270}", false),
    ("nleqq", "\u{2266}\u{338}", false),
    ("nleqslant", "\u{2a7d}\u{338}", false),
    ("nles", "\u{2a7d}\u{338}", false),
    ("nless", "\u{226e}", false),
    ("nlsim", "\u{2274}", false),
    ("nlt", "\u{226e}", false),
    ("nltri", "\u{22ea}", false),
    ("nltrie", "\u{22ec}", false),
    ("nmid", "\u{2224}", false),
    ("nopf", "\u{1d55f}", false),
    ("not", "\u{ac}", true),
    ("notin", "\u{2209}", false),
    ("notinE", "\u{22f9}\u{338}", false),
    ("notindot", "\u{22f5}\u{338}", false),
    ("notinva", "\u{2209}", false),
    ("notinvb", "\u{22f7}", false),
    ("notinvc", "\u{22f6}", false),
    ("notni", "\u{220c}", false),
    ("notniva", "\u{220c}", false),
    ("notnivb", "\u{22fe}", false),
    ("notnivc", "\u{22fd}", false),
    ("npar", "\u{2226}", false),
    ("nparallel", "\u{2226}", false),
    ("nparsl", "\u{2afd}\u{20e5}", false),
    ("npart", "\u{2202}\u{338}", false),
    ("npolint", "\u{2a14}", false),
    ("npr", "\u{2280}", false),
    ("nprcue", "\u{22e0}", false),
    ("npre", "\u{2aaf}\u{338}", false),
    ("nprec", "\u{2280}", false),
    ("npreceq", "\u{2aaf}\u{338}", false),
    ("nrArr", "\u{21cf}", false),
    ("nrarr", "\u{219b}", false),
    ("nrarrc", "\u{2933}\u{338}", false),
    ("nrarrw", "\u{219d}\u{338}", false),
    ("nrightarrow", "\u{219b}", false),
    ("nrtri", "\u{22eb}", false),
    ("nrtrie", "\u{22ed}", false),
    ("nsc", "\u{2281}", false),
    ("nsccue", "\u{22e1}", false),
    ("nsce", "\u{2ab0}\u{338}", false),
    ("nscr", "\u{1d4c3}", false),
    ("nshortmid", "\u{2224}", false),
    ("nshortparallel", "\u{2226}", false),
    ("nsim", "\u{2241}", false),
    ("nsime", "\u{2244}", false),
    ("nsimeq", "\u{2244}", false),
    ("nsmid", "\u{2224}", false),
    ("nspar", "\u{2226}", false),
    ("nsqsube", "\u{22e2}", false),
    ("nsqsupe", "\u{22e3}", false),
    ("nsub", "\u{2284}", false),
    ("nsubE", "\u{2ac5}\u{338}", false),
    ("nsube", "\u{2288}", false),
    ("nsubset", "\u{2282}\u{20d2}", false),
    ("nsubseteq", "\u{2288}", false),
    ("nsubseteqq", "\u{2ac5}\u{338}", false),
    ("nsucc", "\u{2281}", false),
    ("nsucceq", "\u{2ab0}\u{338}", false),
    ("nsup", "\u{2285}", false),
    ("nsupE", "\u{2ac6}\u{338}", false),
    ("nsupe", "\u{2289}", false),
    ("nsupset", "\u{2283}\u{20d2}", false),
    ("nsupseteq", "\u{2289}", false),
    ("nsupseteqq", "\u{2ac6}\u{338}", false),
    ("ntgl", "\u{2279}", false),
    ("ntilde", "\u{f1}", true),
    ("ntlg", "\u{2278}", false),
    ("ntriangleleft", "\u{22ea}", false),
    ("ntrianglelefteq", "\u{22ec}", false),
    ("ntriangleright", "\u{22eb}", false),
    ("ntrianglerighteq", "\u{22ed}", false),
    ("nu", "\u{3bd}", false),
    ("num", "\u{23}", false),
    ("numero", "\u{2116}", false),
    ("numsp", "\u{2007}", false),
    ("nvDash", "\u{22ad}", false),
    ("nvHarr", "\u{2904}", false),
    ("nvap", "\u{224d}\u{20d2}", false),
    ("nvdash", "\u{22ac}", false),
    ("nvge", "\u{2265}\u{20d2}", false),
    ("nvgt", "\u{3e}\u{20d2}", false),
    ("nvinfin", "\u{29de}", false),
    ("nvlArr", "\u{2902}", false),
    ("nvle", "\u{2264}\u{20d2}", false),
    ("nvlt", "\u{3c}\u{20d2}", false),
    ("nvltrie", "\u{22b4}\u{20d2}", false),
    ("nvrArr", "\u{2903}", false),
    ("nvrtrie", "\u{22b5}\u{20d2}", false),
    ("nvsim", "\u{223c}\u{20d2}", false),
    ("nwArr", "\u{21d6}", false),
    ("nwarhk", "\u{2923}", false),
    ("nwarr", "\u{2196}", false),
    ("nwarrow", "\u{2196}", false),
    ("nwnear", "\u{2927}", false),
    ("oS", "\u{24c8}", false),
    ("oacute", "\u{f3}", true),
    ("oast", "\u{229b}", false),
    ("ocir", "\u{229a}", false),
    ("ocirc", "\u{f4}", true),
    ("ocy", "\u{43e}", false),
    ("odash", "\u{229d}", false),
    ("odblac", "\u{151}", false),
    ("odiv", "\u{2a38}", false),
    ("odot", "\u{2299}", false),
    ("odsold", "\u{29bc}", false),
    ("oelig", "\u{153}", false),
    ("ofcir", "\u{29bf}", false),
    ("ofr", "\u{1d52c}", false),
    ("ogon", "\u{2db}", false),
    ("ograve", "\u{f2}", true),
    ("ogt", "\u{29c1}", false),
    ("ohbar", "\u{29b5}", false),
    ("ohm", "\u{3a9}", false),
    ("oint", "\u{222e}", false),
    ("olarr", "\u{21ba}", false),
    ("olcir", "\u{29be}", false),
    ("olcross", "\u{29bb}", false),
    ("oline", "\u{203e}", false),
    ("olt", "\u{29c0}", false),
    ("omacr", "\u{14d}", false),
    ("omega", "\u{3c9}", false),
    ("omicron", "\u{3bf}", false),
    ("omid", "\u{29b6}", false),
    ("ominus", "\u{2296}", false),
    ("oopf", "\u{1d560}", false),
    ("opar", "\u{29b7}", false),
    ("operp", "\u{29b9}", false),
    ("oplus", "\u{2295}", false),
    ("or", "\u{2228}", false),
    ("orarr", "\u{21bb}", false),
    ("ord", "\u{2a5d}", false),
    ("order", "\u{2134}", false),
    ("orderof", "\u{2134}", false),
    ("ordf", "\u{aa}", true),
    ("ordm", "\u{ba}", true),
    ("origof", "\u{22b6}", false),
    ("oror", "\u{2a56}", false),
    ("orslope", "\u{2a57}", false),
    ("orv", "\u{2a5b}", false),
    ("oscr", "\u{2134}", false),
    ("oslash", "\u{f8}", true),
    ("osol", "\u{2298}", false),
    ("otilde", "\u{f5}", true),
    ("otimes", "\u{2297}", false),
    ("otimesas", "\u{2a36}", false),
    ("ouml", "\u{f6}", true),
    ("ovbar", "\u{233d}", false),
    ("par", "\u{2225}", false),
    ("para", "\u{b6}", true),
    ("parallel", "\u{2225}", false),
    ("parsim", "\u{2af3}", false),
    ("parsl", "\u{2afd}", false),
    ("part", "\u{2202}", false),
    ("pcy", "\u{43f}", false),
    ("percnt", "\u{25}", false),
    ("period", "\u{2e}", false),
    ("permil", "\u{2030}", false),
    ("perp", "\u{22a5}", false),
    ("pertenk", "\u{2031}", false),
    ("pfr", "\u{1d52d}", false),
    ("phi", "\u{3c6}", false),
    ("phiv", "\u{3d5}", false),
    ("phmmat", "\u{2133}", false),
    ("phone", "\u{260e}", false),
    ("pi", "\u{3c0}", false),
    ("pitchfork", "\u{22d4}", false),
    ("piv", "\u{3d6}", false),
    ("planck", "\u{210f}", false),
    ("planckh", "\u{210e}", false),
    ("plankv", "\u{210f}", false),
    ("plus", "\u{2b}", false),
    ("plusacir", "\u{2a23}", false),
    ("plusb", "\u{229e}", false),
    ("pluscir", "\u{2a22}", false),
    ("plusdo", "\u{2214}", false),
    ("plusdu", "\u{2a25}", false),
    ("pluse", "\u{2a72}", false),
    ("plusmn", "\u{b1}", true),
    ("plussim", "\u{2a26}", false),
    ("plustwo", "\u{2a27}", false),
    ("pm", "\u{b1}", false),
    ("pointint", "\u{2a15}", false),
    ("popf", "\u{1d561}", false),
    ("pound", "\u{a3}", true),
    ("pr", "\u{227a}", false),
    ("prE", "\u{2ab3}", false),
    ("prap", "\u{2ab7}", false),
    ("prcue", "\u{227c}", false),
    ("pre", "\u{2aaf}", false),
    ("prec", "\u{227a}", false),
    ("precapprox", "\u{2ab7}", false),
    ("preccurlyeq", "\u{227c}", false),
    ("preceq", "\u{2aaf}", false),
    ("precnapprox", "\u{2ab9}", false),
    ("precneqq", "\u{2ab5}", false),
    ("precnsim", "\u{22e8}", false),
    ("precsim", "\u{227e}", false),
    ("prime", "\u{2032}", false),
    ("primes", "\u{2119}", false),
    ("prnE", "\u{2ab5}", false),
    ("prnap", "\u{2ab9}", false),
    ("prnsim", "\u{22e8}", false),
    ("prod", "\u{220f}", false),
    ("profalar", "\u{232e}", false),
    ("profline", "\u{2312}", false),
    ("profsurf", "\u{2313}", false),
    ("prop", "\u{221d}", false),
    ("propto", "\u{221d}", false),
    ("prsim", "\u{227e}", false),
    ("prurel", "\u{22b0}", false),
    ("pscr", "\u{1d4c5}", false),
    ("psi", "\u{3c8}", false),
    ("puncsp", "\u{2008}", false),
    ("qfr", "\u{1d52e}", false),
    ("qint", "\u{2a0c}", false),
    ("qopf", "\u{1d562}", false),
    ("qprime", "\u{2057}", false),
    ("qscr", "\u{1d4c6}", false),
    ("quaternions", "\u{210d}", false),
    ("quatint", "\u{2a16}", false),
    ("quest", "\u{3f}", false),
    ("questeq", "\u{225f}", false),
    ("quot", "\u{22}", true),
    ("rAarr", "\u{21db}", false),
    ("rArr", "\u{21d2}", false),
    ("rAtail", "\u{291c}", false),
    ("rBarr", "\u{290f}", false),
    ("rHar", "\u{2964}", false),
    ("race", "\u{223d}\u{331}", false),
    ("racute", "\u{155}", false),
    ("radic", "\u{221a}", false),
    ("raemptyv", "\u{29b3}", false),
    ("rang", "\u{27e9}", false),
    ("rangd", "\u{2992}", false),
    ("range", "\u{29a5}", false),
    ("rangle", "\u{27e9}", false),
    ("raquo", "\u{bb}", true),
    ("rarr", "\u{2192}", false),
    ("rarrap", "\u{2975}", false),
    ("rarrb", "\u{21e5}", false),
    ("rarrbfs", "\u{2920}", false),
    ("rarrc", "\u{2933}", false),
    ("rarrfs", "\u{291e}", false),
    ("rarrhk", "\u{21aa}", false),
    ("rarrlp", "\u{21ac}", false),
    ("rarrpl", "\u{2945}", false),
    ("rarrsim", "\u{2974}", false),
    ("rarrtl", "\u{21a3}", false),
    ("rarrw", "\u{219d}", false),
    ("ratail", "\u{291a}", false),
    ("ratio", "\u{2236}", false),
    ("rationals", "\u{211a}", false),
    ("rbarr", "\u{290d}", false),
    ("rbbrk", "\u{2773}", false),
    ("rbrace", "\u{7d}", false),
    ("rbrack", "\u{5d}", false),
    ("rbrke", "\u{298c}", false),
    ("rbrksld", "\u{298e}", false),
    ("rbrkslu", "\u{2990}", false),
    ("rcaron", "\u{159}", false),
    ("rcedil", "\u{157}", false),
    ("rceil", "\u{2309}", false),
    ("rcub", "\u{7d}", false),
    ("rcy", "\u{440}", false),
    ("rdca", "\u{2937}", false),
    ("rdldhar", "\u{2969}", false),
    ("rdquo", "\u{201d}", false),
    ("rdquor", "\u{201d}", false),
    ("rdsh", "\u{21b3}", false),
    ("real", "\u{211c}", false),
    ("realine", "\u{211b}", false),
    ("realpart", "\u{211c}", false),
    ("reals", "\u{211d}", false),
    ("rect", "\u{25ad}", false),
    ("reg", "\u{ae}", true),
    ("rfisht", "\u{297d}", false),
    ("rfloor", "\u{230b}", false),
    ("rfr", "\u{1d52f}", false),
    ("rhard", "\u{21c1}", false),
    ("rharu", "\u{21c0}", false),
    ("rharul", "\u{296c}", false),
    ("rho", "\u{3c1}", false),
    ("rhov", "\u{3f1}", false),
    ("rightarrow", "\u{2192}", false),
    ("rightarrowtail", "\u{21a3}", false),
    ("rightharpoondown", "\u{21c1}", false),
    ("rightharpoonup", "\u{21c0}", false),
    ("rightleftarrows", "\u{21c4}", false),
    ("rightleftharpoons", "\u{21cc}", false),
    ("rightrightarrows", "\u{21c9}", false),
    ("rightsquigarrow", "\u{219d}", false),
    ("rightthreetimes", "\u{22cc}", false),
    ("ring", "\u{2da}", false),
    ("risingdotseq", "\u{2253}", false),
    ("rlarr", "\u{21c4}", false),
    ("rlhar", "\u{21cc}", false),
    ("rlm", "\u{200f}", false),
    ("rmoust", "\u{23b1}", false),
    ("rmoustache", "\u{23b1}", false),
    ("rnmid", "\u{2aee}", false),
    ("roang", "\u{27ed}", false),
    ("roarr", "\u{21fe}", false),
    ("robrk", "\u{27e7}", false),
    ("ropar", "\u{2986}", false),
    ("ropf", "\u{1d563}", false),
    ("roplus", "\u{2a2e}", false),
    ("rotimes", "\u{2a35}", false),
    ("rpar", "\u{29}", false),
    ("rpargt", "\u{2994}", false),
    ("rppolint", "\u{2a12}", false),
    ("rrarr", "\u{21c9}", false),
    ("rsaquo", "\u{203a}", false),
    ("rscr", "\u{1d4c7}", false),
    ("rsh", "\u{21b1}", false),
    ("rsqb", "\u{5d}", false),
    ("rsquo", "\u{2019}", false),
    ("rsquor", "\u{2019}", false),
    ("rthree", "\u{22cc}", false),
    ("rtimes", "\u{22ca}", false),
    ("rtri", "\u{25b9}", false),
    ("rtrie", "\u{22b5}", false),
    ("rtrif", "\u{25b8}", false),
    ("rtriltri", "\u{29ce}", false),
    ("ruluhar", "\u{2968}", false),
    ("rx", "\u{211e}", false),
    ("sacute", "\u{15b}", false),
    ("sbquo", "\u{201a}", false),
    ("sc", "\u{227b}", false),
    ("scE", "\u{2ab4}", false),
    ("scap", "\u{2ab8}", false),
    ("scaron", "\u{161}", false),
    ("sccue", "\u{227d}", false),
    ("sce", "\u{2ab0}", false),
    ("scedil", "\u{15f}", false),
    ("scirc", "\u{15d}", false),
    ("scnE", "\u{2ab6}", false),
    ("scnap", "\u{2aba}", false),
    ("scnsim", "\u{22e9}", false),
    ("scpolint", "\u{2a13}", false),
    ("scsim", "\u{227f}", false),
    ("scy", "\u{441}", false),
    ("sdot", "\u{22c5}", false),
    ("sdotb", "\u{22a1}", false),
    ("sdote", "\u{2a66}", false),
    ("seArr", "\u{21d8}", false),
    ("searhk", "\u{2925}", false),
    ("searr", "\u{2198}", false),
    ("searrow", "\u{2198}", false),
    ("sect", "\u{a7}", true),
    ("semi", "\u{3b}", false),
    ("seswar", "\u{2929}", false),
    ("setminus", "\u{2216}", false),
    ("setmn", "\u{2216}", false),
    ("sext", "\u{2736}", false),
    ("sfr", "\u{1d530}", false),
    ("sfrown", "\u{2322}", false),
    ("sharp", "\u{266f}", false),
    ("shchcy", "\u{449}", false),
    ("shcy", "\u{448}", false),
    ("shortmid", "\u{2223}", false),
    ("shortparallel", "\u{2225}", false),
    ("shy", "\u{ad}", true),
    ("sigma", "\u{3c3}", false),
    ("sigmaf", "\u{3c2}", false),
    ("sigmav", "\u{3c2}", false),
    ("sim", "\u{223c}", false),
    ("simdot", "\u{2a6a}", false),
    ("sime", "\u{2243}", false),
    ("simeq", "\u{2243}", false),
    ("simg", "\u{2a9e}", false),
    ("simgE", "\u{2aa0}", false),
    ("siml", "\u{2a9d}", false),
    ("simlE", "\u{2a9f}", false),
    ("simne", "\u{2246}", false),
    ("simplus", "\u{2a24}", false),
    ("simrarr", "\u{2972}", false),
    ("slarr", "\u{2190}", false),
    ("smallsetminus", "\u{2216}", false),
    ("smashp", "\u{2a33}", false),
    ("smeparsl", "\u{29e4}", false),
    ("smid", "\u{2223}", false),
    ("smile", "\u{2323}", false),
    ("smt", "\u{2aaa}", false),
    ("smte", "\u{2aac}", false),
    ("smtes", "\u{2aac}\u{fe00}", false),
    ("softcy", "\u{44c}", false),
    ("sol", "\u{2f}", false),
    ("solb", "\u{29c4}", false),
    ("solbar", "\u{233f}", false),
    ("sopf", "\u{1d564}", false),
    ("spades", "\u{2660}", false),
    ("spadesuit", "\u{2660}", false),
    ("spar", "\u{2225}", false),
    ("sqcap", "\u{2293}", false),
    ("sqcaps", "\u{2293}\u{fe00}", false),
    ("sqcup", "\u{2294}", false),
    ("sqcups", "\u{2294}\u{fe00}", false),
    ("sqsub", "\u{228f}", false),
    ("sqsube", "\u{2291}", false),
    ("sqsubset", "\u{228f}", false),
    ("sqsubseteq", "\u{2291}", false),
    ("sqsup", "\u{2290}", false),
    ("sqsupe", "\u{2292}", false),
    ("sqsupset", "\u{2290}", false),
    ("sqsupseteq", "\u{2292}", false),
    ("squ", "\u{25a1}", false),
    ("square", "\u{25a1}", false),
    ("squarf", "\u{25aa}", false),
    ("squf", "\u{25aa}", false),
    ("srarr", "\u{2192}", false),
    ("sscr", "\u{1d4c8}", false),
    ("ssetmn", "\u{2216}", false),
    ("ssmile", "\u{2323}", false),
    ("sstarf", "\u{22c6}", false),
    ("star", "\u{2606}", false),
    ("starf", "\u{2605}", false),
    ("straightepsilon", "\u{3f5}", false),
    ("straightphi", "\u{3d5}", false),
    ("strns", "\u{af}", false),
    ("sub", "\u{2282}", false),
    ("subE", "\u{2ac5}", false),
    ("subdot", "\u{2abd}", false),
    ("sube", "\u{2286}", false),
    ("subedot", "\u{2ac3}", false),
    ("submult", "\u{2ac1}", false),
    ("subnE", "\u{2acb}", false),
    ("subne", "\u{228a}", false),
    ("subplus", "\u{2abf}", false),
    ("subrarr", "\u{2979}", false),
    ("subset", "\u{2282}", false),
    ("subseteq", "\u{2286}", false),
    ("subseteqq", "\u{2ac5}", false),
    ("subsetneq", "\u{228a}", false),
    ("subsetneqq", "\u{2acb}", false),
    ("subsim", "\u{2ac7}", false),
    ("subsub", "\u{2ad5}", false),
    ("subsup", "\u{2ad3}", false),
    ("succ", "\u{227b}", false),
    ("succapprox", "\u{2ab8}", false),
    ("succcurlyeq", "\u{227d}", false),
    ("succeq", "\u{2ab0}", false),
    ("succnapprox", "\u{2aba}", false),
    ("succneqq", "\u{2ab6}", false),
    ("succnsim", "\u{22e9}", false),
    ("succsim", "\u{227f}", false),
    ("sum", "\u{2211}", false),
    ("sung", "\u{266a}", false),
    ("sup", "\u{2283}", false),
    ("sup1", "\u{b9}", true),
    ("sup2", "\u{b2}", true),
    ("sup3", "\u{b3}", true),
    ("supE", "\u{2ac6}", false),
    ("supdot", "\u{2abe}", false),
    ("supdsub", "\u{2ad8}", false),
    ("supe", "\u{2287}", false),
    ("supedot", "\u{2ac4}", false),
    ("suphsol", "\u{27c9}", false),
    ("suphsub", "\u{2ad7}", false),
    ("suplarr", "\u{297b}", false),
    ("supmult", "\u{2ac2}", false),
    ("supnE", "\u{2acc}", false),
    ("supne", "\u{228b}", false),
    ("supplus", "\u{2ac0}", false),
    ("supset", "\u{2283}", false),
    ("supseteq", "\u{2287}", false),
    ("supseteqq", "\u{2ac6}", false),
    ("supsetneq", "\u{228b}", false),
    ("supsetneqq", "\u{2acc}", false),
    ("supsim", "\u{2ac8}", false),
    ("supsub", "\u{2ad4}", false),
    ("supsup", "\u{2ad6}", false),
    ("swArr", "\u{21d9}", false),
    ("swarhk", "\u{2926}", false),
    ("swarr", "\u{2199}", false),
    ("swarrow", "\u{2199}", false),
    ("swnwar", "\u{292a}", false),
    ("szlig", "\u{df}", true),
    ("target", "\u{2316}", false),
    ("tau", "\u{3c4}", false),
    ("tbrk", "\u{23b4}", false),
    ("tcaron", "\u{165}", false),
    ("tcedil", "\u{163}", false),
    ("tcy", "\u{442}", false),
    ("tdot", "\u{20db}", false),
    ("telrec", "\u{2315}", false),
    ("tfr", "\u{1d531}", false),
    ("there4", "\u{2234}", false),
    ("therefore", "\u{2234}", false),
    ("theta", "\u{3b8}", false),
    ("thetasym", "\u{3d1}", false),
    ("thetav", "\u{3d1}", false),
    ("thickapprox", "\u{2248}", false),
    ("thicksim", "\u{223c}", false),
    ("thinsp", "\u{2009}", false),
    ("thkap", "\u{2248}", false),
    ("thksim", "\u{223c}", false),
    ("thorn", "\u{fe}", true),
    ("tilde", "\u{2dc}", false),
    ("times", "\u{d7}", true),
    ("timesb", "\u{22a0}", false),
    ("timesbar", "\u{2a31}", false),
    ("timesd", "\u{2a30}", false),
    ("tint", "\u{222d}", false),
    ("toea", "\u{2928}", false),
    ("top", "\u{22a4}", false),
    ("topbot", "\u{2336}", false),
    ("topcir", "\u{2af1}", false),
    ("topf", "\u{1d565}", false),
    ("topfork", "\u{2ada}", false),
    ("tosa", "\u{2929}", false),
    ("tprime", "\u{2034}", false),
    ("trade", "\u{2122}", false),
    ("triangle", "\u{25b5}", false),
    ("triangledown", "\u{25bf}", false),
    ("triangleleft", "\u{25c3}", false),
    ("trianglelefteq", "\u{22b4}", false),
    ("triangleq", "\u{225c}", false),
    ("triangleright", "\u{25b9}", false),
    ("trianglerighteq", "\u{22b5}", false),
    ("tridot", "\u{25ec}", false),
    ("trie", "\u{225c}", false),
    ("triminus", "\u{2a3a}", false),
    ("triplus", "\u{2a39}", false),
    ("trisb", "\u{29cd}", false),
    ("tritime", "\u{2a3b}", false),
    ("trpezium", "\u{23e2}", false),
    ("tscr", "\u{1d4c9}", false),
    ("tscy", "\u{446}", false),
    ("tshcy", "\u{45b}", false),
    ("tstrok", "\u{167}", false),
    ("twixt", "\u{226c}", false),
    ("twoheadleftarrow", "\u{219e}", false),
    ("twoheadrightarrow", "\u{21a0}", false),
    ("uArr", "\u{21d1}", false),
    ("uHar", "\u{2963}", false),
    ("uacute", "\u{fa}", true),
    ("uarr", "\u{2191}", false),
    ("ubrcy", "\u{45e}", false),
    ("ubreve", "\u{16d}", false),
    ("ucirc", "\u{fb}", true),
    ("ucy", "\u{443}", false),
    ("udarr", "\u{21c5}", false),
    ("udblac", "\u{171}", false),
    ("udhar", "\u{296e}", false),
    ("ufisht", "\u{297e}", false),
    ("ufr", "\u{1d532}", false),
    ("ugrave", "\u{f9}", true),
    ("uharl", "\u{21bf}", false),
    ("uharr", "\u{21be}", false),
    ("uhblk", "\u{2580}", false),
    ("ulcorn", "\u{231c}", false),
    ("ulcorner", "\u{231c}", false),
    ("ulcrop", "\u{230f}", false),
    ("ultri", "\u{25f8}", false),
    ("umacr", "\u{16b}", false),
    ("uml", "\u{a8}", true),
    ("uogon", "\u{173}", false),
    ("uopf", "\u{1d566}", false),
    ("uparrow", "\u{2191}", false),
    ("updownarrow", "\u{2195}", false),
    ("upharpoonleft", "\u{21bf}", false),
    ("upharpoonright", "\u{21be}", false),
    ("uplus", "\u{228e}", false),
    ("upsi", "\u{3c5}", false),
    ("upsih", "\u{3d2}", false),
    ("upsilon", "\u{3c5}", false),
    ("upuparrows", "\u{21c8}", false),
    ("urcorn", "\u{231d}", false),
    ("urcorner", "\u{231d}", false),
    ("urcrop", "\u{230e}", false),
    ("uring", "\u{16f}", false),
    ("urtri", "\u{25f9}", false),
    ("uscr", "\u{1d4ca}", false),
    ("utdot", "\u{22f0}", false),
    ("utilde", "\u{169}", false),
    ("utri", "\u{25b5}", false),
    ("utrif", "\u{25b4}", false),
    ("uuarr", "\u{21c8}", false),
    ("uuml", "\u{fc}", true),
    ("uwangle", "\u{29a7}", false),
    ("vArr", "\u{21d5}", false),
    ("vBar", "\u{2ae8}", false),
    ("vBarv", "\u{2ae9}", false),
    ("vDash", "\u{22a8}", false),
    ("vangrt", "\u{299c}", false),
    ("varepsilon", "\u{3f5}", false),
    ("varkappa", "\u{3f0}", false),
    ("varnothing", "\u{2205}", false),
    ("varphi", "\u{3d5}", false),
    ("varpi", "\u{3d6}", false),
    ("varpropto", "\u{221d}", false),
    ("varr", "\u{2195}", false),
    ("varrho", "\u{3f1}", false),
    ("varsigma", "\u{3c2}", false),
    ("varsubsetneq", "\u{228a}\u{fe00}", false),
    ("varsubsetneqq", "\u{2acb}\u{fe00}", false),
    ("varsupsetneq", "\u{228b}\u{fe00}", false),
    ("varsupsetneqq", "\u{2acc}\u{fe00}", false),
    ("vartheta", "\u{3d1}", false),
    ("vartriangleleft", "\u{22b2}", false),
    ("vartriangleright", "\u{22b3}", false),
    ("vcy", "\u{432}", false),
    ("vdash", "\u{22a2}", false),
    ("vee", "\u{2228}", false),
    ("veebar", "\u{22bb}", false),
    ("veeeq", "\u{225a}", false),
    ("vellip", "\u{22ee}", false),
    ("verbar", "\u{7c}", false),
    ("vert", "\u{7c}", false),
    ("vfr", "\u{1d533}", false),
    ("vltri", "\u{22b2}", false),
    ("vnsub", "\u{2282}\u{20d2}", false),
    ("vnsup", "\u{2283}\u{20d2}", false),
    ("vopf", "\u{1d567}", false),
    ("vprop", "\u{221d}", false),
    ("vrtri", "\u{22b3}", false),
    ("vscr", "\u{1d4cb}", false),
    ("vsubnE", "\u{2acb}\u{fe00}", false),
    ("vsubne", "\u{228a}\u{fe00}", false),
    ("vsupnE", "\u{2acc}\u{fe00}", false),
    ("vsupne", "\u{228b}\u{fe00}", false),
    ("vzigzag", "\u{299a}", false),
    ("wcirc", "\u{175}", false),
    ("wedbar", "\u{2a5f}", false),
    ("wedge", "\u{2227}", false),
    ("wedgeq", "\u{2259}", false),
    ("weierp", "\u{2118}", false),
    ("wfr", "\u{1d534}", false),
    ("wopf", "\u{1d568}", false),
    ("wp", "\u{2118}", false),
    ("wr", "\u{2240}", false),
    ("wreath", "\u{2240}", false),
    ("wscr", "\u{1d4cc}", false),
    ("xcap", "\u{22c2}", false),
    ("xcirc", "\u{25ef}", false),
    ("xcup", "\u{22c3}", false),
    ("xdtri", "\u{25bd}", false),
    ("xfr", "\u{1d535}", false),
    ("xhArr", "\u{27fa}", false),
    ("xharr", "\u{27f7}", false),
    ("xi", "\u{3be}", false),
    ("xlArr", "\u{27f8}", false),
    ("xlarr", "\u{27f5}", false),
    ("xmap", "\u{27fc}", false),
    ("xnis", "\u{22fb}", false),
    ("xodot", "\u{2a00}", false),
    ("xopf", "\u{1d569}", false),
    ("xoplus", "\u{2a01}", false),
    ("xotime", "\u{2a02}", false),
    ("xrArr", "\u{27f9}", false),
    ("xrarr", "\u{27f6}", false),
    ("xscr", "\u{1d4cd}", false),
    ("xsqcup", "\u{2a06}", false),
    ("xuplus", "\u{2a04}", false),
    ("xutri", "\u{25b3}", false),
    ("xvee", "\u{22c1}", false),
    ("xwedge", "\u{22c0}", false),
    ("yacute", "\u{fd}", true),
    ("yacy", "\u{44f}", false),
    ("ycirc", "\u{177}", false),
    ("ycy", "\u{44b}", false),
    ("yen", "\u{a5}", true),
    ("yfr", "\u{1d536}", false),
    ("yicy", "\u{457}", false),
    ("yopf", "\u{1d56a}", false),
    ("yscr", "\u{1d4ce}", false),
    ("yucy", "\u{44e}", false),
    ("yuml", "\u{ff}", true),
    ("zacute", "\u{17a}", false),
    ("zcaron", "\u{17e}", false),
    ("zcy", "\u{437}", false),
    ("zdot", "\u{17c}", false),
    ("zeetrf", "\u{2128}", false),
    ("zeta", "\u{3b6}", false),
    ("zfr", "\u{1d537}", false),
    ("zhcy", "\u{436}", false),
    ("zigrarr", "\u{21dd}", false),
    ("zopf", "\u{1d56b}", false),
    ("zscr", "\u{1d4cf}", false),
    ("zwj", "\u{200d}", false),
    ("zwnj", "\u{200c}", false),
];
