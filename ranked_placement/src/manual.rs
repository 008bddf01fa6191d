/*!

This is the long-form manual for `ranked_placement` and `racetally`.

## Counting rules

Each placement (first, second, third, ...) is decided by its own
single-winner election:

1. The candidates already placed are removed from the race and from every
   ballot. Ballots simply move up to their next choice.
2. The winning threshold is `floor(valid ballots / 2) + 1`, where a valid
   ballot has at least one choice among the running candidates.
3. In each round, the first remaining choice of every ballot is counted. A
   candidate reaching the threshold wins the placement.
4. Otherwise the candidate with the fewest votes is eliminated. When several
   candidates share the fewest votes, the one with the lowest tiebreak score
   is eliminated. If the scores are also equal, the candidate listed first in
   the race is eliminated.
5. When a single candidate is left, it wins the placement. If it was the only
   candidate from the start, its count is the number of ballots in the race.

The threshold is not lowered when ballots run out of choices. This is why a
placement can be won by the last candidate standing.

This is deliberately not a multi-winner STV count: there is no surplus
transfer between placements. The second place is "who would win if the first
place had not been running".

## Election description

`racetally` reads a JSON file:

```json
{
  "outputSettings": {
    "contestName": "Spring cup",
    "outputDirectory": "output",
    "contestDate": "2024-04-01"
  },
  "candidates": [
    { "id": "red", "name": "Red team", "tiebreakScore": 120 },
    { "id": "blue", "name": "Blue team", "tiebreakScore": 95 }
  ],
  "ballots": [["red", "blue"], ["blue"]],
  "ballotSources": [
    {
      "provider": "csv",
      "filePath": "ranks.csv",
      "raceId": "spring-cup",
      "raceColumnIndex": 1,
      "voterColumnIndex": 2,
      "candidateColumnIndex": 3,
      "rankColumnIndex": 4,
      "firstRowIndex": 2
    }
  ],
  "rules": { "topN": 3 }
}
```

- `candidates` (required): in order. `tiebreakScore` defaults to 0.
- `ballots` (optional): ballots already ordered, first choice first.
- `ballotSources` (optional): files of rank-tagged rows, one row per
  (voter, candidate, rank). `provider` is `csv` or `xlsx`.
- `rules.topN` (optional, default 3): the number of placements.

### Ballot sources

The rows are grouped by voter, in the order in which voters first appear.
Within a voter, choices are sorted by rank. If a candidate appears several
times for the same voter, its best rank is kept.

Column indices are 1-based numbers (`3`) or Excel-style letters (`"C"`).
`firstRowIndex` (1-based, default 1) skips header rows. When
`raceColumnIndex` and `raceId` are both given, only the rows of this race
are used. A `raceId` requires a `raceColumnIndex`. For `xlsx` files,
`excelWorksheetName` selects the worksheet (default: the first one).

## Summary

The summary follows the spirit of the RCVis format:

```json
{
  "config": { "contest": "Spring cup", "topN": "3", "fingerprint": "..." },
  "placements": [ { "rank": 1, "candidate": "red" } ],
  "results": [
    {
      "seat": 1,
      "round": 1,
      "threshold": "2",
      "tally": { "red": "1", "blue": "1" },
      "tallyResults": [ { "eliminated": "blue", "transfers": { "exhausted": "1" } } ]
    }
  ]
}
```

The `fingerprint` is a SHA-256 digest of the candidates, the ballots and the
rules. Passing `--reference` with a previous summary replays the election
and fails if anything differs.

 */
