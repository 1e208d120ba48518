use cbcov::bins::{generate_bins_list, Bin};
use cbcov::genome::Genome;

#[test]
fn test_generate_bins_boundary() {
    let genome = Genome {
        seqnames: vec!["chr1".to_string()],
        lengths: vec![250],
    };

    let bins = generate_bins_list(&genome, 100);

    assert_eq!(bins.len(), 1);
    let (chrom, chr1_bins) = &bins[0];
    assert_eq!(chrom, "chr1");

    let ends: Vec<u64> = chr1_bins.iter().map(|b| b.end).collect();
    assert_eq!(ends, vec![100, 200, 300]);
}

#[test]
fn test_generate_bins_count_and_ordering() {
    let genome = Genome {
        seqnames: vec!["chr1".to_string(), "chr2".to_string(), "chr3".to_string()],
        lengths: vec![1000, 250, 99],
    };
    let bin_size = 100;

    let bins = generate_bins_list(&genome, bin_size);

    // ceil(L / B) bins per chromosome
    assert_eq!(bins[0].1.len(), 10);
    assert_eq!(bins[1].1.len(), 3);
    assert_eq!(bins[2].1.len(), 1);

    for (i, (chrom, chrom_bins)) in bins.iter().enumerate() {
        assert_eq!(chrom, &genome.seqnames[i]);
        let length = genome.lengths[i];
        let mut previous = 0;
        for bin in chrom_bins {
            assert_eq!(bin.chrom, *chrom);
            assert_eq!(bin.end % bin_size, 0, "bin ends must be multiples of bin size");
            assert!(bin.end > previous, "bin ends must be strictly increasing");
            assert!(bin.end <= length + bin_size);
            previous = bin.end;
        }
    }
}

#[test]
fn test_generate_bins_zero_length_chromosome() {
    let genome = Genome {
        seqnames: vec!["chr1".to_string()],
        lengths: vec![0],
    };

    let bins = generate_bins_list(&genome, 100);

    assert_eq!(bins.len(), 1);
    assert!(bins[0].1.is_empty());
}

#[test]
fn test_bin_id_and_start() {
    let bin = Bin::new("chr19", 4343400);

    assert_eq!(bin.id(), "chr19_4343400");
    assert_eq!(bin.to_string(), "chr19_4343400");
    assert_eq!(bin.start(100), 4343300);
}
